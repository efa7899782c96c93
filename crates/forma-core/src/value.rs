//! Attribute values and ordered attribute maps.
//!
//! Construction input, entity overlays, and stored records all share one shape:
//! an insertion-ordered map from attribute name to a JSON value. Order matters
//! because attribute surfaces are enumerated in declaration order.

use indexmap::IndexMap;

pub use serde_json::Value;

/// Ordered map of attribute name to value.
pub type Attributes = IndexMap<String, Value>;

/// Build an [`Attributes`] map from `key => value` pairs.
///
/// ```
/// use forma_core::attrs;
///
/// let input = attrs! { "user_email" => "mo@example.com", "user_age" => 41 };
/// assert_eq!(input.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::value::Attributes::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Attributes::new();
        $(
            map.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        map
    }};
}

/// Whether a value counts as blank: `null`, `false`, whitespace-only strings,
/// and empty arrays or objects.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Interpret a value as a number. Numeric strings are accepted.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render a value the way it is used as a lookup key or measured for length.
///
/// Strings render without quotes; everything else uses its JSON form.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
