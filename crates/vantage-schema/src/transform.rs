use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{Result, SchemaError};
use crate::value::Value;

/// A unit transform applied to a parsed raw value.
///
/// Transforms compose left-to-right and run only on non-null values. Most
/// map numbers to numbers; [`TimeOfDay`](Transform::TimeOfDay) and
/// [`StormDate`](Transform::StormDate) widen the value to a time or date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Multiply. Consoles store tenths of °F, thousandths of inHg, rain
    /// bucket clicks and similar scaled integers.
    Scale(f64),
    /// Add. Extra/soil/leaf temperatures are transmitted with a +90 bias.
    Offset(f64),
    /// Round to a number of decimal places.
    Round(u32),
    /// Decode `hour * 100 + minute`; encodings outside a valid time of day
    /// become null.
    TimeOfDay,
    /// Decode the packed storm-start date: month in bits 15–12, day in bits
    /// 11–7, year − 2000 in bits 6–0. Invalid dates become null.
    StormDate,
}

impl Transform {
    /// Apply this transform to a non-null value.
    pub fn apply(self, value: Value) -> Result<Value> {
        let number = match &value {
            Value::Number(n) => *n,
            _ => {
                return Err(SchemaError::BadTransform {
                    transform: self.to_string(),
                    value: format!("{value:?}"),
                })
            }
        };

        Ok(match self {
            Transform::Scale(factor) => Value::Number(number * factor),
            Transform::Offset(amount) => Value::Number(number + amount),
            Transform::Round(places) => {
                let factor = 10f64.powi(places as i32);
                Value::Number((number * factor).round() / factor)
            }
            Transform::TimeOfDay => {
                let encoded = number as i64;
                let hour = (encoded / 100) as u32;
                let minute = (encoded.rem_euclid(100)) as u32;
                match NaiveTime::from_hms_opt(hour, minute, 0) {
                    Some(time) if encoded >= 0 => Value::Time(time),
                    _ => Value::Null,
                }
            }
            Transform::StormDate => {
                let encoded = number as i64;
                let month = ((encoded >> 12) & 0x0F) as u32;
                let day = ((encoded >> 7) & 0x1F) as u32;
                let year = 2000 + (encoded & 0x7F) as i32;
                match NaiveDate::from_ymd_opt(year, month, day) {
                    Some(date) => Value::Date(date),
                    None => Value::Null,
                }
            }
        })
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Scale(factor) => write!(f, "scale({factor})"),
            Transform::Offset(amount) => write!(f, "offset({amount})"),
            Transform::Round(places) => write!(f, "round({places})"),
            Transform::TimeOfDay => f.write_str("time-of-day"),
            Transform::StormDate => f.write_str("storm-date"),
        }
    }
}
