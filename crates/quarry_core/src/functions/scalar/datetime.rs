use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use quarry_error::{eval_error, Result};

use crate::types::scalar::{parse_timestamp, timestamp_from_unix, ScalarValue};

/// Part of a date/time value to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// 1 = Sunday, 7 = Saturday.
    DayOfWeek,
    DayOfYear,
}

impl DatePart {
    pub const ALL: &'static [DatePart] = &[
        DatePart::Year,
        DatePart::Month,
        DatePart::Day,
        DatePart::Hour,
        DatePart::Minute,
        DatePart::Second,
        DatePart::DayOfWeek,
        DatePart::DayOfYear,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::DayOfWeek => "DAYOFWEEK",
            Self::DayOfYear => "DAYOFYEAR",
        }
    }

    /// Look up a date part function by its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<DatePart> {
        Self::ALL
            .iter()
            .find(|part| part.name().eq_ignore_ascii_case(name))
            .copied()
    }

    /// Extract this part from `value`.
    ///
    /// Accepts dates, timestamps, date/time strings, and integer unix
    /// timestamps (seconds). NULL input produces NULL.
    pub fn extract(&self, value: &ScalarValue) -> Result<ScalarValue> {
        let ts = match value {
            ScalarValue::Null => return Ok(ScalarValue::Null),
            ScalarValue::Timestamp(ts) => *ts,
            ScalarValue::Date(date) => date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| eval_error!("invalid date: {date}"))?,
            ScalarValue::Utf8(s) => parse_timestamp(s)
                .ok_or_else(|| eval_error!("{}: unable to parse '{s}' as a date", self.name()))?,
            other => match other.as_i128() {
                Some(secs) => timestamp_from_unix(secs)?,
                None => {
                    return Err(eval_error!(
                        "{}: invalid input of type {}",
                        self.name(),
                        other.datatype()
                    ));
                }
            },
        };

        Ok(ScalarValue::Int32(self.extract_from_timestamp(&ts)))
    }

    fn extract_from_timestamp(&self, ts: &NaiveDateTime) -> i32 {
        match self {
            Self::Year => ts.year(),
            Self::Month => ts.month() as i32,
            Self::Day => ts.day() as i32,
            Self::Hour => ts.hour() as i32,
            Self::Minute => ts.minute() as i32,
            Self::Second => ts.second() as i32,
            Self::DayOfWeek => ts.weekday().num_days_from_sunday() as i32 + 1,
            Self::DayOfYear => ts.ordinal() as i32,
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sunday, November 22, 2009 12:35:45 UTC
    const TS_DATE: i64 = 1258893345;
    const STRING_DATE: &str = "2007-01-02 14:15:16";

    #[test]
    fn year() {
        let cases = [
            (ScalarValue::Null, ScalarValue::Null),
            (ScalarValue::from(STRING_DATE), ScalarValue::Int32(2007)),
            (ScalarValue::Int64(TS_DATE), ScalarValue::Int32(2009)),
        ];

        for (input, expected) in cases {
            assert_eq!(expected, DatePart::Year.extract(&input).unwrap(), "{input}");
        }
    }

    #[test]
    fn month_day_and_time() {
        let input = ScalarValue::from(STRING_DATE);
        assert_eq!(ScalarValue::Int32(1), DatePart::Month.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(2), DatePart::Day.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(14), DatePart::Hour.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(15), DatePart::Minute.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(16), DatePart::Second.extract(&input).unwrap());
    }

    #[test]
    fn unix_timestamp_parts() {
        let input = ScalarValue::Int64(TS_DATE);
        assert_eq!(ScalarValue::Int32(11), DatePart::Month.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(1), DatePart::DayOfWeek.extract(&input).unwrap());
        assert_eq!(ScalarValue::Int32(326), DatePart::DayOfYear.extract(&input).unwrap());
    }

    #[test]
    fn timestamp_input() {
        let ts = parse_timestamp(STRING_DATE).unwrap();
        let got = DatePart::DayOfYear
            .extract(&ScalarValue::Timestamp(ts))
            .unwrap();
        assert_eq!(ScalarValue::Int32(2), got);
    }

    #[test]
    fn invalid_input_errors() {
        let err = DatePart::Year
            .extract(&ScalarValue::Binary(vec![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));

        let err = DatePart::Year
            .extract(&ScalarValue::from("not a date"))
            .unwrap_err();
        assert!(matches!(err, quarry_error::DbError::Evaluation(_)));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Some(DatePart::DayOfWeek), DatePart::from_name("dayofweek"));
        assert_eq!(None, DatePart::from_name("fortnight"));
    }
}
