use clap::{Parser, Subcommand, ValueEnum};
use sqlite_helper::SqliteConfig;
use std::path::PathBuf;
use strum::Display;

/// Run raw SQL against a single SQLite database file
///
/// Defaults come from `SQLITE_DB_PATH`, `SQLITE_READ_ONLY`, `SQLITE_CREATE` and
/// `SQLITE_CONNECTION_STRING` (a `.env` file is read too); flags override them.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// path of the database file
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// create the database file if it does not exist
    #[arg(long, global = true)]
    pub create: bool,

    /// open an existing database for writing
    #[arg(long, global = true)]
    pub read_write: bool,

    /// full connection string, e.g. "Data Source=app.sqlite; Version=3"
    #[arg(long, global = true, conflicts_with = "db")]
    pub connection_string: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema, optionally dropping the old one first
    Init {
        /// schema statements
        sql: Option<String>,
        /// read the schema statements from a file
        #[arg(long, conflicts_with = "sql")]
        file: Option<PathBuf>,
        /// statements run before the schema, a failure skips the schema
        #[arg(long)]
        drop_sql: Option<String>,
    },
    /// Run statements that return no rows
    Exec { sql: String },
    /// Print the first column of the first row
    Scalar {
        sql: String,
        #[arg(long = "as", value_enum, default_value_t = ScalarKind::Value)]
        kind: ScalarKind,
    },
    /// Print every row as JSON
    Table {
        sql: String,
        /// name given to the result table
        #[arg(long, default_value = "result")]
        name: String,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(ValueEnum, Display, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ScalarKind {
    /// whatever SQLite stored
    Value,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Bool,
    String,
    Date,
    DateTime,
}

impl Cli {
    /// layers the flags over the environment configuration
    pub fn apply_to(&self, mut config: SqliteConfig) -> SqliteConfig {
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
            config.connection_string = None;
        }
        if let Some(connection_string) = &self.connection_string {
            config.connection_string = Some(connection_string.clone());
        }
        if self.create {
            config.create = true;
        }
        if self.read_write {
            config.read_only = false;
        }
        config
    }
}
