use rusqlite::Row;
use rusqlite::types::{FromSqlError, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// A single value as stored by SQLite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            CellValue::Null => ColumnType::Null,
            CellValue::Integer(_) => ColumnType::Integer,
            CellValue::Real(_) => ColumnType::Real,
            CellValue::Text(_) => ColumnType::Text,
            CellValue::Blob(_) => ColumnType::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// TEXT that is not valid UTF-8 is rejected rather than replaced
impl TryFrom<ValueRef<'_>> for CellValue {
    type Error = FromSqlError;

    fn try_from(value: ValueRef<'_>) -> Result<Self, Self::Error> {
        Ok(match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(r) => CellValue::Real(r),
            ValueRef::Text(_) => CellValue::Text(value.as_str()?.to_string()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        })
    }
}

/// value of column `index` in `row`
pub(crate) fn cell_at(row: &Row<'_>, index: usize) -> rusqlite::Result<CellValue> {
    let value = row.get_ref(index)?;
    CellValue::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, value.data_type(), Box::new(e))
    })
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Real(r) => write!(f, "{r}"),
            CellValue::Text(t) => write!(f, "{t}"),
            CellValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Storage class of a column, taken from its first non NULL value
#[derive(Debug, Display, EnumString, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColumnType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Materialized query result: ordered named columns and ordered rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn set_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.columns = names
            .into_iter()
            .map(|name| Column {
                name: name.to_string(),
                column_type: ColumnType::Null,
            })
            .collect();
    }

    pub(crate) fn push_row(&mut self, row: Vec<CellValue>) {
        for (column, value) in self.columns.iter_mut().zip(row.iter()) {
            if column.column_type == ColumnType::Null {
                column.column_type = value.column_type();
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// value at `row` in the column called `column`
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}

#[cfg(test)]
mod table_tests {
    use super::*;

    #[test]
    fn column_type_comes_from_first_non_null() {
        let mut table = DataTable::new("people");
        table.set_columns(["id", "nickname"]);
        table.push_row(vec![CellValue::Integer(1), CellValue::Null]);
        table.push_row(vec![CellValue::Integer(2), CellValue::Text("bo".to_string())]);
        table.push_row(vec![CellValue::Integer(3), CellValue::Real(1.5)]);

        assert_eq!(table.columns[0].column_type, ColumnType::Integer);
        assert_eq!(table.columns[1].column_type, ColumnType::Text);
        assert_eq!(
            table.get(1, "NICKNAME"),
            Some(&CellValue::Text("bo".to_string()))
        );
        assert_eq!(table.get(5, "id"), None);
        assert_eq!(table.get(0, "missing"), None);
    }

    #[test]
    fn serializes_cells_as_plain_json() {
        let mut table = DataTable::new("t");
        table.set_columns(["a", "b"]);
        table.push_row(vec![CellValue::Integer(7), CellValue::Null]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["name"], "t");
        assert_eq!(json["columns"][0]["column_type"], "integer");
        assert_eq!(json["rows"][0][0], 7);
        assert!(json["rows"][0][1].is_null());
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        assert!(CellValue::try_from(ValueRef::Text(&[0xff, b'a'])).is_err());
        assert_eq!(
            CellValue::try_from(ValueRef::Text(b"ok")).unwrap(),
            CellValue::Text("ok".to_string())
        );
        assert_eq!(
            CellValue::try_from(ValueRef::Blob(&[0xff])).unwrap(),
            CellValue::Blob(vec![0xff])
        );
    }
}
