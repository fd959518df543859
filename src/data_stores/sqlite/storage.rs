use crate::data_stores::sqlite::connection_string::ConnectionDescriptor;
use crate::data_stores::sqlite::errors::SqliteError;
use crate::data_stores::sqlite::outcome::OperationOutcome;
use crate::data_stores::sqlite::scalar::FromScalar;
use crate::data_stores::sqlite::table::{CellValue, DataTable, cell_at};
use log::{error, trace, warn};
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};
use std::env::{self, VarError};
use std::fs;
use std::result::Result;

pub struct SqliteConfig {
    pub db_path: Option<String>,
    /// ignored when `create` is set
    pub read_only: bool,
    pub create: bool,
    /// used verbatim instead of building one from the other fields
    pub connection_string: Option<String>,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_only: true,
            create: false,
            connection_string: None,
        }
    }
}

impl SqliteConfig {
    /// Reads `SQLITE_DB_PATH`, `SQLITE_READ_ONLY`, `SQLITE_CREATE` and `SQLITE_CONNECTION_STRING`
    pub fn from_env() -> Result<Self, SqliteError> {
        Self::from_vars(|key| env::var(key))
    }

    fn from_vars(lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, SqliteError> {
        let optional = |key: &str| match lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(e) => Err(SqliteError::from(e)),
        };
        let flag = |key: &str, default: bool| -> Result<bool, SqliteError> {
            match optional(key)? {
                None => Ok(default),
                Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" => Ok(true),
                    "0" | "false" | "no" => Ok(false),
                    _ => Err(SqliteError::Configuration(format!(
                        "`{key}` should be true or false, got `{value}`"
                    ))),
                },
            }
        };

        let defaults = Self::default();
        Ok(Self {
            db_path: optional("SQLITE_DB_PATH")?,
            read_only: flag("SQLITE_READ_ONLY", defaults.read_only)?,
            create: flag("SQLITE_CREATE", defaults.create)?,
            connection_string: optional("SQLITE_CONNECTION_STRING")?,
        })
    }

    pub fn descriptor(&self) -> Result<ConnectionDescriptor, SqliteError> {
        match (&self.connection_string, &self.db_path) {
            (Some(connection_string), _) => ConnectionDescriptor::parse(connection_string),
            (None, Some(db_path)) if self.create => Ok(ConnectionDescriptor::create(db_path)),
            (None, Some(db_path)) => Ok(ConnectionDescriptor::open(db_path, self.read_only)),
            (None, None) => Err(SqliteError::Configuration(
                "either a database path or a connection string is needed".to_string(),
            )),
        }
    }
}

/// Runs raw SQL against a single SQLite file.
///
/// Every operation opens its own connection and releases it before returning, so nothing is
/// held open between calls. The outcome of the last call is kept in [`OperationOutcome`] in
/// addition to being returned. If the file was missing at construction (and not being
/// created) the helper is disabled and every operation fails without touching the file.
///
/// Statements are never parameterized: callers must not build SQL from untrusted input.
pub struct SqliteHelper {
    descriptor: ConnectionDescriptor,
    connection_string: String,
    outcome: OperationOutcome,
}

impl SqliteHelper {
    pub fn new(config: SqliteConfig) -> Result<SqliteHelper, SqliteError> {
        let descriptor = config.descriptor()?;
        let connection_string = config
            .connection_string
            .unwrap_or_else(|| descriptor.to_string());
        let mut outcome = OperationOutcome::default();
        if descriptor.is_missing() {
            let err = SqliteError::MissingDatabase {
                path: descriptor.data_source.clone(),
            };
            error!("{err}");
            outcome.disable(&err);
        }
        Ok(SqliteHelper {
            descriptor,
            connection_string,
            outcome,
        })
    }

    /// existing database file, optionally read only
    pub fn open(db_path: &str, read_only: bool) -> Result<SqliteHelper, SqliteError> {
        Self::new(SqliteConfig {
            db_path: Some(db_path.to_string()),
            read_only,
            ..Default::default()
        })
    }

    /// database file that is created on first use if needed
    pub fn create(db_path: &str) -> Result<SqliteHelper, SqliteError> {
        Self::new(SqliteConfig {
            db_path: Some(db_path.to_string()),
            create: true,
            ..Default::default()
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn outcome(&self) -> &OperationOutcome {
        &self.outcome
    }

    pub fn general_error(&self) -> bool {
        self.outcome.general_error
    }

    pub fn sql_error(&self) -> bool {
        self.outcome.sql_error
    }

    pub fn sql_error_message(&self) -> &str {
        &self.outcome.sql_error_message
    }

    pub fn sql_error_code(&self) -> i32 {
        self.outcome.sql_error_code
    }

    /// Runs `sql` after the optional `drop_sql`. A failing drop skips `sql`; the two are not
    /// wrapped in a transaction so a successful drop stays even if `sql` fails.
    pub fn initialize_schema(
        &mut self,
        sql: &str,
        drop_sql: Option<&str>,
    ) -> Result<(), SqliteError> {
        self.with_connection(|conn| {
            if let Some(drop_sql) = drop_sql {
                trace!("drop: {drop_sql}");
                conn.execute_batch(drop_sql)
                    .map_err(|e| failed_query("schema drop", drop_sql, e))?;
            }
            trace!("create: {sql}");
            conn.execute_batch(sql)
                .map_err(|e| failed_query("schema creation", sql, e))
        })
    }

    /// Runs one or more statements that return no rows, giving back the rows changed by the
    /// last one
    pub fn execute(&mut self, sql: &str) -> Result<u64, SqliteError> {
        self.with_connection(|conn| {
            trace!("execute: {sql}");
            conn.execute_batch(sql)
                .map_err(|e| failed_query("statement", sql, e))?;
            Ok(conn.changes())
        })
    }

    /// First column of the first row, `None` when the query returned no rows. Every statement
    /// in `sql` runs; the first one that returns columns supplies the value.
    pub fn query_value(&mut self, sql: &str) -> Result<Option<CellValue>, SqliteError> {
        self.with_connection(|conn| {
            trace!("scalar: {sql}");
            first_value(conn, sql).map_err(|e| failed_query("scalar query", sql, e))
        })
    }

    pub fn query_scalar<T: FromScalar>(&mut self, sql: &str) -> Result<T, SqliteError> {
        self.with_connection(|conn| {
            trace!("scalar: {sql}");
            let value = first_value(conn, sql)
                .map_err(|e| failed_query("scalar query", sql, e))?
                .unwrap_or(CellValue::Null);
            T::from_scalar(value)
        })
    }

    /// [`Self::query_scalar`] that falls back to the zero value, check [`Self::outcome`] after
    pub fn scalar_or_default<T: FromScalar + Default>(&mut self, sql: &str) -> T {
        self.query_scalar(sql).unwrap_or_default()
    }

    pub fn query_table(&mut self, sql: &str, table_name: &str) -> Result<DataTable, SqliteError> {
        let mut table = DataTable::new(table_name);
        self.fill_table(sql, &mut table)?;
        Ok(table)
    }

    /// [`Self::query_table`] that keeps whatever rows were read before a failure
    pub fn table_or_empty(&mut self, sql: &str, table_name: &str) -> DataTable {
        let mut table = DataTable::new(table_name);
        // the failure is already in the outcome
        let _ = self.fill_table(sql, &mut table);
        table
    }

    fn fill_table(&mut self, sql: &str, table: &mut DataTable) -> Result<(), SqliteError> {
        self.with_connection(|conn| {
            trace!("table {}: {sql}", table.name);
            fill_rows(conn, sql, table).map_err(|e| failed_query("table query", sql, e))
        })
    }

    fn with_connection<T>(
        &mut self,
        op: impl FnOnce(&Connection) -> Result<T, SqliteError>,
    ) -> Result<T, SqliteError> {
        if self.outcome.general_error {
            return Err(SqliteError::MissingDatabase {
                path: self.descriptor.data_source.clone(),
            });
        }
        self.outcome.begin();
        let result = self.connect().and_then(|conn| {
            let result = op(&conn);
            if let Err((_, e)) = conn.close() {
                // the connection is still released when it is dropped here
                warn!("Could not cleanly close `{}`: {e}", self.descriptor.data_source);
            }
            result
        });
        if let Err(err) = &result {
            error!("{err}");
            self.outcome.fail(err);
        }
        result
    }

    fn connect(&self) -> Result<Connection, SqliteError> {
        let path = self.descriptor.path();
        if !self.descriptor.fail_if_missing
            && !self.descriptor.read_only
            && let Some(parent_dir) = path.parent()
            && !parent_dir.as_os_str().is_empty()
            && !parent_dir.exists()
        {
            fs::create_dir_all(parent_dir)?;
        }
        Connection::open_with_flags(&path, self.descriptor.open_flags()).map_err(
            |e| SqliteError::FailedSqliteQuery {
                query_info: format!("opening `{}`", self.descriptor.data_source),
                source: e,
            },
        )
    }
}

fn failed_query(what: &str, sql: &str, source: rusqlite::Error) -> SqliteError {
    SqliteError::FailedSqliteQuery {
        query_info: format!("{what} `{sql}`"),
        source,
    }
}

/// Runs every statement in `sql`; the first one that yields columns supplies the value.
fn first_value(conn: &Connection, sql: &str) -> rusqlite::Result<Option<CellValue>> {
    let mut batch = Batch::new(conn, sql);
    let mut value = None;
    let mut answered = false;
    while let Some(mut statement) = batch.next()? {
        if statement.column_count() == 0 {
            statement.execute([])?;
            continue;
        }
        let mut rows = statement.query([])?;
        let row = rows.next()?;
        if !answered {
            answered = true;
            value = row.map(|row| cell_at(row, 0)).transpose()?;
        }
    }
    Ok(value)
}

fn fill_rows(conn: &Connection, sql: &str, table: &mut DataTable) -> rusqlite::Result<()> {
    let mut statement = conn.prepare(sql)?;
    table.set_columns(statement.column_names());
    let column_count = statement.column_count();
    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let values = (0..column_count)
            .map(|i| cell_at(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(values);
    }
    Ok(())
}
