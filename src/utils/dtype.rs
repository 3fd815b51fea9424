//! Best-effort scalar coercion.
//!
//! Every function here is total: input that cannot be converted yields the
//! caller's default or an explicit absent value, never an error.

use serde_json::Value;

use crate::utils::date::to_iso;

const TRUTHY: &[&str] = &["true", "yes", "1", "y"];
const FALSY: &[&str] = &["false", "no", "0", "n"];

/// Three-valued result of a boolean coercion. `Unknown` must never be read as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn as_option(self) -> Option<bool> {
        match self {
            Truth::True => Some(true),
            Truth::False => Some(false),
            Truth::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != Truth::Unknown
    }
}

impl From<bool> for Truth {
    fn from(b: bool) -> Self {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }
}

impl From<Truth> for Value {
    fn from(t: Truth) -> Self {
        t.as_option().map_or(Value::Null, Value::Bool)
    }
}

fn strip_number(s: &str) -> String {
    s.replace(',', "").trim().to_string()
}

fn float_to_i64(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(t as i64)
    } else {
        None
    }
}

/// Parses numbers like `"1,000"` or `"30.0"` and truncates toward zero.
pub fn to_int(value: &Value, default: Option<i64>) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_i64)),
        Value::String(s) => {
            let cleaned = strip_number(s);
            cleaned
                .parse::<i64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    };
    parsed.or(default)
}

pub fn to_float(value: &Value, default: Option<f64>) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => strip_number(s).parse::<f64>().ok(),
        _ => None,
    };
    parsed.or(default)
}

/// Bools pass through, numbers use truthiness, strings are matched
/// case-insensitively against yes/no style words. Everything else is `Unknown`.
pub fn to_bool(value: &Value) -> Truth {
    match value {
        Value::Bool(b) => Truth::from(*b),
        Value::String(s) => {
            let lowered = s.to_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                Truth::True
            } else if FALSY.contains(&lowered.as_str()) {
                Truth::False
            } else {
                Truth::Unknown
            }
        }
        Value::Number(n) => Truth::from(n.as_f64().map_or(true, |f| f != 0.0)),
        _ => Truth::Unknown,
    }
}

/// Null becomes `default`; anything else is stringified and trimmed.
pub fn to_str(value: &Value, default: &str) -> String {
    match value {
        Value::Null => default.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Stringifies `value` and re-emits it as `YYYY-MM-DD` if any known date format matches.
pub fn to_date_iso(value: &Value) -> Option<String> {
    to_iso(&to_str(value, ""))
}
