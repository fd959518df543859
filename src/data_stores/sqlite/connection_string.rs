use crate::data_stores::sqlite::errors::SqliteError;
use log::warn;
use rusqlite::OpenFlags;
use std::fmt;
use std::path::{Path, PathBuf};

const SUPPORTED_VERSION: &str = "3";

/// How to open the database file, rendered in the `Data Source=...; Version=3` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub data_source: String,
    pub fail_if_missing: bool,
    pub read_only: bool,
}

impl ConnectionDescriptor {
    /// open or create the file at `path`, never read only
    pub fn create(path: &str) -> Self {
        Self {
            data_source: path.to_string(),
            fail_if_missing: false,
            read_only: false,
        }
    }

    /// open an existing file at `path`
    pub fn open(path: &str, read_only: bool) -> Self {
        Self {
            data_source: path.to_string(),
            fail_if_missing: true,
            read_only,
        }
    }

    /// Parses `key=value` pairs separated by `;`. Keys are case insensitive and may be
    /// surrounded by whitespace (`ReadOnly = True` is valid).
    pub fn parse(connection_string: &str) -> Result<Self, SqliteError> {
        let invalid = |reason: String| SqliteError::InvalidConnectionString {
            connection_string: connection_string.to_string(),
            reason,
        };

        let mut data_source = None;
        let mut fail_if_missing = false;
        let mut read_only = false;
        for pair in connection_string.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(invalid(format!("`{pair}` is not a key=value pair")));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "data source" => data_source = Some(value.to_string()),
                "version" => {
                    if value != SUPPORTED_VERSION {
                        return Err(invalid(format!("unsupported version `{value}`")));
                    }
                }
                "failifmissing" => fail_if_missing = parse_flag(value).map_err(invalid)?,
                "readonly" => read_only = parse_flag(value).map_err(invalid)?,
                other => warn!("Ignoring unsupported connection string key `{other}`"),
            }
        }

        match data_source {
            Some(data_source) if !data_source.is_empty() => Ok(Self {
                data_source,
                fail_if_missing,
                read_only,
            }),
            _ => Err(invalid("missing `Data Source`".to_string())),
        }
    }

    /// File path handed to SQLite. The bundled library treats a leading `file:` as a URI
    /// even without SQLITE_OPEN_URI, so such names get a `./` prefix.
    pub fn path(&self) -> PathBuf {
        if self.data_source.starts_with("file:") {
            Path::new(".").join(&self.data_source)
        } else {
            PathBuf::from(&self.data_source)
        }
    }

    /// true when opening would fail because the file is absent
    pub fn is_missing(&self) -> bool {
        self.fail_if_missing && !self.path().exists()
    }

    pub fn open_flags(&self) -> OpenFlags {
        // no SQLITE_OPEN_URI: `Data Source` is always a plain file path
        let base = OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            base | OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.fail_if_missing {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
        } else {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("`{value}` is not True or False"))
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data Source={}; Version={SUPPORTED_VERSION}", self.data_source)?;
        if self.fail_if_missing {
            write!(f, "; FailIfMissing=True")?;
        }
        if self.read_only {
            write!(f, "; ReadOnly = True")?;
        }
        Ok(())
    }
}
