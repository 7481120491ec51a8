use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use chrono::{DateTime, NaiveTime, Utc};

/// Carrier for `ExpressionType::StringSet` values.
pub type StringSet = Rc<BTreeSet<String>>;
/// Carrier for `ExpressionType::StringList` values.
pub type StringList = Rc<Vec<String>>;

/// A single evaluation result.
///
/// Numeric results (both INTEGER and DOUBLE typed expressions) are carried as
/// `f64` with NaN marking a missing value; every other variant uses `None` as
/// its missing marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(Option<bool>),
    String(Option<String>),
    Instant(Option<DateTime<Utc>>),
    LocalTime(Option<NaiveTime>),
    StringSet(Option<StringSet>),
    StringList(Option<StringList>),
}

impl Value {
    /// Returns `true` if this value is the missing marker of its type.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Number(v) => v.is_nan(),
            Value::Boolean(v) => v.is_none(),
            Value::String(v) => v.is_none(),
            Value::Instant(v) => v.is_none(),
            Value::LocalTime(v) => v.is_none(),
            Value::StringSet(v) => v.is_none(),
            Value::StringList(v) => v.is_none(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", format_number(*v)),
            Value::Boolean(Some(b)) => write!(f, "{}", b),
            Value::String(Some(s)) => write!(f, "{}", s),
            Value::Instant(Some(t)) => write!(f, "{}", t.to_rfc3339()),
            Value::LocalTime(Some(t)) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::StringSet(Some(s)) => {
                write!(f, "{{{}}}", s.iter().cloned().collect::<Vec<_>>().join(", "))
            }
            Value::StringList(Some(l)) => write!(f, "[{}]", l.join(", ")),
            _ => write!(f, "?"),
        }
    }
}

/// Formats a numeric value the way the expression language renders numbers:
/// integral values without a decimal point, everything else trimmed to at most
/// six fractional digits.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "?".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "\u{221e}" } else { "-\u{221e}" }.to_string();
    }
    if (value - value.trunc()).abs() < f64::EPSILON && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.6}", value);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        s.to_string()
    }
}
