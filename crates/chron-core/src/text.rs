//! Canonical text coercion.
//!
//! Every value that ends up in a timeline cell goes through [`ToText`]:
//!
//! | Input            | Text                                   |
//! |------------------|----------------------------------------|
//! | null / `None`    | `""`                                   |
//! | string           | itself                                 |
//! | number / bool    | textual form (`1`, `2.5`, `true`)      |
//! | `DateTime<Utc>`  | ISO-8601 with milliseconds, `Z` suffix |
//! | array / object   | compact JSON                           |

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Placeholder used when a structured value cannot be serialized.
pub const UNSERIALIZABLE: &str = "[Unserializable]";

/// Conversion into the canonical display text of a timeline value.
pub trait ToText {
    fn to_text(&self) -> String;
}

impl ToText for str {
    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl ToText for String {
    fn to_text(&self) -> String {
        self.clone()
    }
}

impl ToText for bool {
    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl ToText for i64 {
    fn to_text(&self) -> String {
        self.to_string()
    }
}

impl ToText for f64 {
    fn to_text(&self) -> String {
        float_text(*self)
    }
}

impl ToText for DateTime<Utc> {
    fn to_text(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl<T: ToText> ToText for Option<T> {
    fn to_text(&self) -> String {
        self.as_ref().map_or_else(String::new, ToText::to_text)
    }
}

impl<T: ToText + ?Sized> ToText for &T {
    fn to_text(&self) -> String {
        (**self).to_text()
    }
}

impl ToText for Value {
    fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    n.as_f64().map_or_else(|| n.to_string(), float_text)
                }
            }
            other => serde_json::to_string(other).unwrap_or_else(|_| UNSERIALIZABLE.to_string()),
        }
    }
}

/// Whole floats print without a trailing `.0` (`3.0` → `3`).
fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
