use rusqlite::ffi;
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite database error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("Input/Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Database file `{path}` does not exist")]
    MissingDatabase { path: String },

    #[error("Invalid connection string `{connection_string}`: {reason}")]
    InvalidConnectionString {
        connection_string: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Value conversion failed: {0}")]
    ValueConversionError(String),

    #[error("Failed query {query_info}: {source}")]
    FailedSqliteQuery {
        query_info: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Which tier of the error taxonomy a failure belongs to
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// precondition failures that disable the helper (missing file, bad configuration)
    General,
    /// faults raised while running a statement or converting its result
    Sql,
}

impl SqliteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqliteError::MissingDatabase { .. }
            | SqliteError::InvalidConnectionString { .. }
            | SqliteError::Configuration(_)
            | SqliteError::EnvVar(_)
            | SqliteError::Io(_) => ErrorKind::General,
            SqliteError::Rusqlite(_)
            | SqliteError::ValueConversionError(_)
            | SqliteError::FailedSqliteQuery { .. } => ErrorKind::Sql,
        }
    }

    /// Numeric code in the SQLite primary result code space
    pub fn code(&self) -> i32 {
        match self {
            SqliteError::Rusqlite(e) | SqliteError::FailedSqliteQuery { source: e, .. } => {
                engine_error_code(e)
            }
            SqliteError::ValueConversionError(_) => ffi::SQLITE_MISMATCH,
            SqliteError::MissingDatabase { .. } => ffi::SQLITE_CANTOPEN,
            SqliteError::Io(_) => ffi::SQLITE_IOERR,
            SqliteError::InvalidConnectionString { .. }
            | SqliteError::Configuration(_)
            | SqliteError::EnvVar(_) => ffi::SQLITE_MISUSE,
        }
    }
}

fn engine_error_code(e: &rusqlite::Error) -> i32 {
    match e {
        // extended codes keep the primary code in the low byte
        rusqlite::Error::SqliteFailure(failure, _) => failure.extended_code & 0xff,
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::Utf8Error(..) => ffi::SQLITE_MISMATCH,
        rusqlite::Error::InvalidColumnIndex(_) | rusqlite::Error::InvalidColumnName(_) => {
            ffi::SQLITE_RANGE
        }
        _ => ffi::SQLITE_ERROR,
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn missing_database_is_general() {
        let err = SqliteError::MissingDatabase {
            path: "nowhere.sqlite".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::General);
        assert_eq!(err.code(), ffi::SQLITE_CANTOPEN);
        assert!(err.to_string().contains("nowhere.sqlite"));
    }

    #[test]
    fn conversion_failures_are_sql_mismatches() {
        let err = SqliteError::ValueConversionError("`abc` is not an integer".to_string());
        assert_eq!(err.kind(), ErrorKind::Sql);
        assert_eq!(err.code(), ffi::SQLITE_MISMATCH);
    }

    #[test]
    fn engine_failures_keep_primary_code() {
        let source = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed".to_string()),
        );
        let err = SqliteError::FailedSqliteQuery {
            query_info: "insert".to_string(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::Sql);
        assert_eq!(err.code(), ffi::SQLITE_CONSTRAINT);
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::General.to_string(), "general");
        assert_eq!(ErrorKind::from_str("sql").unwrap(), ErrorKind::Sql);
    }
}
