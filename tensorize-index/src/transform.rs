use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::key::TypedKey;

/// Which component of a parsed date a [`KeyTransform::Date`] extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

/// A key-transform strategy injected by the caller.
///
/// The contract is convert-or-fail: return `Some` with the typed key, or
/// `None` to signal that the raw value cannot be converted (the row is then
/// pruned rather than crashing the run).
pub type CustomTransform = Arc<dyn Fn(&str) -> Option<TypedKey> + Send + Sync>;

/// How a raw field value becomes a typed key.
///
/// This is a closed enumeration of the conversions a mode can apply before
/// counting and sorting, replacing the original design's arbitrary evaluated
/// functions. [`KeyTransform::Custom`] remains as an injected-strategy escape
/// hatch for callers of the library; the CLI only exposes the named kinds.
#[derive(Clone, Default)]
pub enum KeyTransform {
    /// Identity: the key is the raw field text.
    #[default]
    Str,
    /// Parse as a 64-bit signed integer.
    Int,
    /// Parse as a 64-bit float (NaN fails the conversion).
    Float,
    /// Parse as a float, then round to `digits` decimal places.
    Round { digits: u32 },
    /// Parse as a calendar date and extract one component as an integer key.
    Date { part: DatePart },
    /// Caller-supplied conversion strategy.
    Custom(CustomTransform),
}

impl fmt::Debug for KeyTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTransform::Str => f.write_str("Str"),
            KeyTransform::Int => f.write_str("Int"),
            KeyTransform::Float => f.write_str("Float"),
            KeyTransform::Round { digits } => write!(f, "Round({digits})"),
            KeyTransform::Date { part } => write!(f, "Date({part:?})"),
            KeyTransform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl KeyTransform {
    /// Apply the transform to a raw field value.
    ///
    /// Returns `None` when the value cannot be converted; the caller decides
    /// whether that is a skip (counting) or a prune (emission).
    pub fn apply(&self, raw: &str) -> Option<TypedKey> {
        match self {
            KeyTransform::Str => Some(TypedKey::Str(raw.to_string())),
            KeyTransform::Int => raw.trim().parse::<i64>().ok().map(TypedKey::Int),
            KeyTransform::Float => raw.trim().parse::<f64>().ok().and_then(TypedKey::float),
            KeyTransform::Round { digits } => {
                let value = raw.trim().parse::<f64>().ok()?;
                let scale = 10f64.powi(*digits as i32);
                TypedKey::float((value * scale).round() / scale)
            }
            KeyTransform::Date { part } => {
                let date = parse_date(raw.trim())?;
                let component = match part {
                    DatePart::Year => i64::from(date.year()),
                    DatePart::Month => i64::from(date.month()),
                    DatePart::Day => i64::from(date.day()),
                };
                Some(TypedKey::Int(component))
            }
            KeyTransform::Custom(func) => func(raw),
        }
    }
}

/// Accepted date layouts, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
