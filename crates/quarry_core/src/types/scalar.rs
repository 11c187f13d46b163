use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use quarry_error::{eval_error, Result};

use super::datatype::DataType;

/// A single value.
///
/// Equality and hashing are structural: `Int32(1)` and `Int64(1)` are
/// different values. Floats compare and hash by bit pattern so that values can
/// be used as keys in distinct sets and group tables.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::UInt8(_) => DataType::UInt8,
            Self::UInt16(_) => DataType::UInt16,
            Self::UInt32(_) => DataType::UInt32,
            Self::UInt64(_) => DataType::UInt64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::Binary(_) => DataType::Binary,
            Self::Date(_) => DataType::Date,
            Self::Timestamp(_) => DataType::Timestamp,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as an integer if it's any integer type.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Self::Int8(v) => *v as i128,
            Self::Int16(v) => *v as i128,
            Self::Int32(v) => *v as i128,
            Self::Int64(v) => *v as i128,
            Self::UInt8(v) => *v as i128,
            Self::UInt16(v) => *v as i128,
            Self::UInt32(v) => *v as i128,
            Self::UInt64(v) => *v as i128,
            _ => return None,
        })
    }

    /// Get the value as a float if it's any numeric type.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Interpret the value as a SQL truth value.
    ///
    /// NULL maps to `None`. Numeric values are true when non-zero.
    pub fn try_as_bool(&self) -> Result<Option<bool>> {
        match self {
            Self::Null => Ok(None),
            Self::Boolean(b) => Ok(Some(*b)),
            other => match other.as_f64() {
                Some(v) => Ok(Some(v != 0.0)),
                None => Err(eval_error!(
                    "cannot interpret {} value '{other}' as a boolean",
                    other.datatype()
                )),
            },
        }
    }

    /// Compare two values.
    ///
    /// Returns `None` if either side is NULL. Numeric values of different
    /// widths are compared after widening.
    pub fn try_cmp(&self, other: &ScalarValue) -> Result<Option<Ordering>> {
        let ord = match (self, other) {
            (Self::Null, _) | (_, Self::Null) => return Ok(None),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Utf8(a), Self::Utf8(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Binary(a), Self::Binary(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Date(a), Self::Timestamp(b)) => date_to_timestamp(a)?.cmp(b),
            (Self::Timestamp(a), Self::Date(b)) => a.cmp(&date_to_timestamp(b)?),
            (a, b) => match (a.as_i128(), b.as_i128()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    _ => {
                        return Err(eval_error!(
                            "cannot compare {} with {}",
                            a.datatype(),
                            b.datatype()
                        ));
                    }
                },
            },
        };
        Ok(Some(ord))
    }

    /// Cast this value to some other type.
    pub fn cast_to(&self, datatype: &DataType) -> Result<ScalarValue> {
        if self.is_null() {
            return Ok(ScalarValue::Null);
        }
        if self.datatype() == *datatype {
            return Ok(self.clone());
        }

        let out = match datatype {
            DataType::Null => ScalarValue::Null,
            DataType::Utf8 => ScalarValue::Utf8(self.to_string()),
            DataType::Boolean => match self.try_as_bool() {
                Ok(Some(b)) => ScalarValue::Boolean(b),
                _ => match self {
                    Self::Utf8(s) => match s.to_ascii_lowercase().as_str() {
                        "true" | "t" | "1" => ScalarValue::Boolean(true),
                        "false" | "f" | "0" => ScalarValue::Boolean(false),
                        _ => return Err(self.cast_error(datatype)),
                    },
                    _ => return Err(self.cast_error(datatype)),
                },
            },
            DataType::Float32 | DataType::Float64 => {
                let v = match self {
                    Self::Utf8(s) => s.trim().parse::<f64>().map_err(|_| self.cast_error(datatype))?,
                    Self::Boolean(b) => *b as u8 as f64,
                    other => other.as_f64().ok_or_else(|| self.cast_error(datatype))?,
                };
                if *datatype == DataType::Float32 {
                    ScalarValue::Float32(v as f32)
                } else {
                    ScalarValue::Float64(v)
                }
            }
            dt if dt.is_integer() => {
                let v: i128 = match self {
                    Self::Utf8(s) => s.trim().parse::<i128>().map_err(|_| self.cast_error(datatype))?,
                    Self::Boolean(b) => *b as i128,
                    Self::Float32(_) | Self::Float64(_) => {
                        let f = self.as_f64().unwrap_or(f64::NAN);
                        if !f.is_finite() {
                            return Err(self.cast_error(datatype));
                        }
                        f.trunc() as i128
                    }
                    other => other.as_i128().ok_or_else(|| self.cast_error(datatype))?,
                };
                integer_from_i128(v, dt).ok_or_else(|| self.cast_error(datatype))?
            }
            DataType::Date => match self {
                Self::Utf8(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .ok()
                    .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
                    .map(ScalarValue::Date)
                    .ok_or_else(|| self.cast_error(datatype))?,
                Self::Timestamp(ts) => ScalarValue::Date(ts.date()),
                _ => return Err(self.cast_error(datatype)),
            },
            DataType::Timestamp => match self {
                Self::Utf8(s) => parse_timestamp(s)
                    .map(ScalarValue::Timestamp)
                    .ok_or_else(|| self.cast_error(datatype))?,
                Self::Date(d) => ScalarValue::Timestamp(date_to_timestamp(d)?),
                other => match other.as_i128() {
                    Some(secs) => ScalarValue::Timestamp(timestamp_from_unix(secs)?),
                    None => return Err(self.cast_error(datatype)),
                },
            },
            DataType::Binary => match self {
                Self::Utf8(s) => ScalarValue::Binary(s.as_bytes().to_vec()),
                _ => return Err(self.cast_error(datatype)),
            },
            _ => return Err(self.cast_error(datatype)),
        };

        Ok(out)
    }

    fn cast_error(&self, datatype: &DataType) -> quarry_error::DbError {
        eval_error!("cannot cast {} value '{self}' to {datatype}", self.datatype())
    }
}

fn integer_from_i128(v: i128, datatype: &DataType) -> Option<ScalarValue> {
    Some(match datatype {
        DataType::Int8 => ScalarValue::Int8(v.try_into().ok()?),
        DataType::Int16 => ScalarValue::Int16(v.try_into().ok()?),
        DataType::Int32 => ScalarValue::Int32(v.try_into().ok()?),
        DataType::Int64 => ScalarValue::Int64(v.try_into().ok()?),
        DataType::UInt8 => ScalarValue::UInt8(v.try_into().ok()?),
        DataType::UInt16 => ScalarValue::UInt16(v.try_into().ok()?),
        DataType::UInt32 => ScalarValue::UInt32(v.try_into().ok()?),
        DataType::UInt64 => ScalarValue::UInt64(v.try_into().ok()?),
        _ => return None,
    })
}

fn date_to_timestamp(date: &NaiveDate) -> Result<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| eval_error!("invalid date: {date}"))
}

/// Convert seconds since the Unix epoch into a UTC timestamp.
pub fn timestamp_from_unix(secs: i128) -> Result<NaiveDateTime> {
    let secs: i64 = secs
        .try_into()
        .map_err(|_| eval_error!("unix timestamp out of range: {secs}"))?;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| eval_error!("unix timestamp out of range: {secs}"))
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp from one of the accepted text layouts.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, a bare `YYYY-MM-DD` date, and RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Int8(a), Self::Int8(b)) => a == b,
            (Self::Int16(a), Self::Int16(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::UInt8(a), Self::UInt8(b)) => a == b,
            (Self::UInt16(a), Self::UInt16(b)) => a == b,
            (Self::UInt32(a), Self::UInt32(b)) => a == b,
            (Self::UInt64(a), Self::UInt64(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => (),
            Self::Boolean(v) => v.hash(state),
            Self::Int8(v) => v.hash(state),
            Self::Int16(v) => v.hash(state),
            Self::Int32(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::UInt8(v) => v.hash(state),
            Self::UInt16(v) => v.hash(state),
            Self::UInt32(v) => v.hash(state),
            Self::UInt64(v) => v.hash(state),
            Self::Float32(v) => v.to_bits().hash(state),
            Self::Float64(v) => v.to_bits().hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Binary(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::Timestamp(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Binary(v) => {
                write!(f, "\\x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<u64> for ScalarValue {
    fn from(value: u64) -> Self {
        ScalarValue::UInt64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ScalarValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmp_widens_numerics() {
        let a = ScalarValue::Int8(3);
        let b = ScalarValue::Int64(7);
        assert_eq!(Some(Ordering::Less), a.try_cmp(&b).unwrap());

        let c = ScalarValue::Float64(2.5);
        assert_eq!(Some(Ordering::Greater), a.try_cmp(&c).unwrap());
    }

    #[test]
    fn cmp_null_is_unknown() {
        assert_eq!(None, ScalarValue::Null.try_cmp(&ScalarValue::Int32(1)).unwrap());
        assert_eq!(None, ScalarValue::Int32(1).try_cmp(&ScalarValue::Null).unwrap());
    }

    #[test]
    fn cmp_text_is_bytewise() {
        let upper = ScalarValue::from("A");
        let lower = ScalarValue::from("a");
        assert_eq!(Some(Ordering::Less), upper.try_cmp(&lower).unwrap());
    }

    #[test]
    fn cmp_incompatible_errors() {
        let err = ScalarValue::from("a")
            .try_cmp(&ScalarValue::Int32(1))
            .unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));
    }

    #[test]
    fn structural_equality() {
        assert_ne!(ScalarValue::Int32(1), ScalarValue::Int64(1));
        assert_eq!(ScalarValue::Float64(f64::NAN), ScalarValue::Float64(f64::NAN));
    }

    #[test]
    fn cast_string_to_timestamp() {
        let v = ScalarValue::from("2007-01-02 14:15:16")
            .cast_to(&DataType::Timestamp)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2007, 1, 2)
            .unwrap()
            .and_hms_opt(14, 15, 16)
            .unwrap();
        assert_eq!(ScalarValue::Timestamp(expected), v);
    }

    #[test]
    fn cast_out_of_range_integer() {
        let err = ScalarValue::Int64(300)
            .cast_to(&DataType::Int8)
            .unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));
    }

    #[test]
    fn cast_int_to_text() {
        assert_eq!(
            ScalarValue::from("42"),
            ScalarValue::Int32(42).cast_to(&DataType::Utf8).unwrap()
        );
    }
}
