pub mod connection_string;
pub mod errors;
pub mod outcome;
pub mod scalar;
pub mod storage;
pub mod table;

pub use connection_string::ConnectionDescriptor;
pub use errors::{ErrorKind, SqliteError};
pub use outcome::OperationOutcome;
pub use scalar::FromScalar;
pub use storage::{SqliteConfig, SqliteHelper};
pub use table::{CellValue, Column, ColumnType, DataTable};
