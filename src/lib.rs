pub mod data_stores;
pub mod errors;

pub use data_stores::sqlite::{
    CellValue, Column, ColumnType, ConnectionDescriptor, DataTable, ErrorKind, FromScalar,
    OperationOutcome, SqliteConfig, SqliteError, SqliteHelper,
};
