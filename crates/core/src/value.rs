//! Runtime value tree matched by shape patterns.
//!
//! Every input handed to a matcher is lowered into a `Value` first. Records
//! carry the name of their shape so patterns can tell members of a closed
//! variant apart; `Absent` is the explicit "no value" marker.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// An immutable structured value. Equality is structural.
///
/// Numbers with a fractional part use `rust_decimal::Decimal` -- never `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    List(Vec<Value>),
    Record {
        shape: String,
        fields: BTreeMap<String, Value>,
    },
    Absent,
}

impl Value {
    /// Build a record value of the given shape from `(field, value)` pairs.
    pub fn record<I, K>(shape: impl Into<String>, fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record {
            shape: shape.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::List(_) => "List",
            Value::Record { .. } => "Record",
            Value::Absent => "Absent",
        }
    }

    /// The shape name of a record, `None` for every other value.
    pub fn shape(&self) -> Option<&str> {
        match self {
            Value::Record { shape, .. } => Some(shape),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Look up a field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Decimals, and integers widened to decimals.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render as JSON. Decimals are emitted as strings to keep them exact;
    /// records become objects with a `"shape"` key next to their fields.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::json!(b),
            Value::Int(i) => serde_json::json!(i),
            Value::Decimal(d) => serde_json::json!(d.to_string()),
            Value::Text(t) => serde_json::json!(t),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record { shape, fields } => {
                let mut map = serde_json::Map::new();
                map.insert("shape".to_string(), serde_json::json!(shape));
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Absent => serde_json::Value::Null,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// ──────────────────────────────────────────────
// Lowering typed records into values
// ──────────────────────────────────────────────

/// A typed value that can be lowered into the `Value` tree.
pub trait Shaped {
    fn to_value(&self) -> Value;
}

impl Shaped for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(region: &str, tier: &str) -> Value {
        Value::record(
            "Identity",
            [("region", Value::from(region)), ("tier", Value::from(tier))],
        )
    }

    #[test]
    fn records_compare_structurally() {
        assert_eq!(identity("EU", "PREMIUM"), identity("EU", "PREMIUM"));
        assert_ne!(identity("EU", "PREMIUM"), identity("US", "PREMIUM"));
    }

    #[test]
    fn same_fields_different_shape_are_not_equal() {
        let a = Value::record("A", [("x", Value::Int(1))]);
        let b = Value::record("B", [("x", Value::Int(1))]);
        assert_ne!(a, b);
    }

    #[test]
    fn field_lookup() {
        let id = identity("EU", "STANDARD");
        assert_eq!(id.shape(), Some("Identity"));
        assert_eq!(id.field("tier").and_then(Value::as_text), Some("STANDARD"));
        assert!(id.field("missing").is_none());
        assert!(Value::Int(3).field("tier").is_none());
    }

    #[test]
    fn int_widens_to_decimal() {
        assert_eq!(Value::Int(7).as_decimal(), Some(Decimal::from(7)));
        assert_eq!(Value::from("7").as_decimal(), None);
    }

    #[test]
    fn to_json_keeps_decimals_exact() {
        let v = Value::record(
            "Usage",
            [
                ("quantity", Value::Decimal(Decimal::new(1505, 1))),
                ("tags", Value::List(vec![Value::from("a"), Value::Absent])),
            ],
        );
        assert_eq!(
            v.to_json(),
            serde_json::json!({
                "shape": "Usage",
                "quantity": "150.5",
                "tags": ["a", null]
            })
        );
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Absent.type_name(), "Absent");
        assert_eq!(identity("EU", "X").type_name(), "Record");
        assert!(Value::Absent.is_absent());
        assert!(!Value::Bool(false).is_absent());
    }
}
