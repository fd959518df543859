use crate::data_stores::sqlite::errors::SqliteError;
use crate::data_stores::sqlite::table::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Types a scalar query result can be converted into.
///
/// A NULL (or a query without rows) converts to the type's zero value; use `Option<T>` to tell
/// the two apart.
pub trait FromScalar: Sized {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError>;
}

fn conversion_error(value: &CellValue, target: &str) -> SqliteError {
    SqliteError::ValueConversionError(format!(
        "cannot convert {} `{value}` to {target}",
        value.column_type()
    ))
}

fn real_to_i64(r: f64) -> Option<i64> {
    let rounded = r.round_ties_even();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

fn to_i64(value: &CellValue, target: &str) -> Result<i64, SqliteError> {
    match value {
        CellValue::Null => Ok(0),
        CellValue::Integer(i) => Ok(*i),
        CellValue::Real(r) => real_to_i64(*r).ok_or_else(|| conversion_error(value, target)),
        CellValue::Text(t) => {
            let t = t.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().and_then(real_to_i64))
                .ok_or_else(|| conversion_error(value, target))
        }
        CellValue::Blob(_) => Err(conversion_error(value, target)),
    }
}

fn to_f64(value: &CellValue, target: &str) -> Result<f64, SqliteError> {
    match value {
        CellValue::Null => Ok(0.0),
        CellValue::Integer(i) => Ok(*i as f64),
        CellValue::Real(r) => Ok(*r),
        CellValue::Text(t) => t
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion_error(value, target)),
        CellValue::Blob(_) => Err(conversion_error(value, target)),
    }
}

macro_rules! integer_from_scalar {
    ($($t:ty),*) => {$(
        impl FromScalar for $t {
            fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
                let wide = to_i64(&value, stringify!($t))?;
                <$t>::try_from(wide).map_err(|_| conversion_error(&value, stringify!($t)))
            }
        }
    )*};
}

integer_from_scalar!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromScalar for f64 {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        to_f64(&value, "f64")
    }
}

impl FromScalar for f32 {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        let wide = to_f64(&value, "f32")?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(conversion_error(&value, "f32"));
        }
        Ok(narrow)
    }
}

/// Integers are exact; reals carry whatever binary rounding SQLite stored them with.
impl FromScalar for Decimal {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        match &value {
            CellValue::Null => Ok(Decimal::ZERO),
            CellValue::Integer(i) => Ok(Decimal::from(*i)),
            CellValue::Real(r) => {
                Decimal::try_from(*r).map_err(|_| conversion_error(&value, "decimal"))
            }
            CellValue::Text(t) => {
                let t = t.trim();
                Decimal::from_str(t)
                    .or_else(|_| Decimal::from_scientific(t))
                    .map_err(|_| conversion_error(&value, "decimal"))
            }
            CellValue::Blob(_) => Err(conversion_error(&value, "decimal")),
        }
    }
}

impl FromScalar for bool {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        match &value {
            CellValue::Null => Ok(false),
            CellValue::Integer(i) => Ok(*i != 0),
            CellValue::Real(r) => Ok(*r != 0.0),
            CellValue::Text(t) => {
                let t = t.trim();
                if t.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if t.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    t.parse::<f64>()
                        .map(|n| n != 0.0)
                        .map_err(|_| conversion_error(&value, "bool"))
                }
            }
            CellValue::Blob(_) => Err(conversion_error(&value, "bool")),
        }
    }
}

impl FromScalar for String {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        Ok(match value {
            CellValue::Null => String::new(),
            CellValue::Text(t) => t,
            CellValue::Blob(b) => String::from_utf8(b).map_err(|e| {
                SqliteError::ValueConversionError(format!("blob is not valid UTF-8 text: {e}"))
            })?,
            other => other.to_string(),
        })
    }
}

impl FromScalar for Vec<u8> {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        match value {
            CellValue::Null => Ok(Vec::new()),
            CellValue::Blob(b) => Ok(b),
            CellValue::Text(t) => Ok(t.into_bytes()),
            other => Err(conversion_error(&other, "bytes")),
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Integers are unix seconds and reals are julian days, matching SQLite's date functions.
impl FromScalar for NaiveDateTime {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        let converted = match &value {
            CellValue::Null => return Ok(NaiveDateTime::default()),
            CellValue::Integer(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
            CellValue::Real(julian_day) => {
                let millis = ((julian_day - UNIX_EPOCH_JULIAN_DAY) * MILLIS_PER_DAY).round();
                real_to_i64(millis)
                    .and_then(DateTime::from_timestamp_millis)
                    .map(|dt| dt.naive_utc())
            }
            CellValue::Text(t) => parse_datetime(t),
            CellValue::Blob(_) => None,
        };
        converted.ok_or_else(|| conversion_error(&value, "datetime"))
    }
}

impl FromScalar for NaiveDate {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        NaiveDateTime::from_scalar(value).map(|dt| dt.date())
    }
}

impl FromScalar for CellValue {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        Ok(value)
    }
}

impl<T: FromScalar> FromScalar for Option<T> {
    fn from_scalar(value: CellValue) -> Result<Self, SqliteError> {
        match value {
            CellValue::Null => Ok(None),
            other => T::from_scalar(other).map(Some),
        }
    }
}
