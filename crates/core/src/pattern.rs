//! Shape patterns.
//!
//! A pattern is a tree mirroring the structure of the values it matches.
//! Matching a value both tests its shape and collects the sub-values bound
//! by `Bind` nodes, so a nested field can be projected in a single step
//! without intermediate checks.

use std::collections::BTreeMap;

use crate::value::Value;

/// Names bound by a successful match, borrowing from the pattern and value.
pub type Captures<'a> = BTreeMap<&'a str, &'a Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches any present value. Never matches `Absent`.
    Any,
    /// Like `Any`, and binds the value to a name.
    Bind(String),
    /// Matches only the absent marker.
    Absent,
    /// Matches a structurally equal value.
    Literal(Value),
    /// Matches a record of this shape whose listed fields match their
    /// sub-patterns. Unlisted fields are ignored.
    Record {
        shape: String,
        fields: Vec<(String, Pattern)>,
    },
}

impl Pattern {
    pub fn any() -> Pattern {
        Pattern::Any
    }

    pub fn bind(name: impl Into<String>) -> Pattern {
        Pattern::Bind(name.into())
    }

    pub fn absent() -> Pattern {
        Pattern::Absent
    }

    pub fn literal(value: impl Into<Value>) -> Pattern {
        Pattern::Literal(value.into())
    }

    /// Start a record pattern; add sub-patterns with [`RecordPattern::field`].
    pub fn record(shape: impl Into<String>) -> RecordPattern {
        RecordPattern {
            shape: shape.into(),
            fields: Vec::new(),
        }
    }

    /// Test `value` against this pattern, adding bindings to `captures`.
    ///
    /// On a failed match `captures` may hold partial bindings; callers use a
    /// fresh map per attempt.
    pub fn matches<'a>(&'a self, value: &'a Value, captures: &mut Captures<'a>) -> bool {
        match self {
            Pattern::Any => !value.is_absent(),
            Pattern::Bind(name) => {
                if value.is_absent() {
                    return false;
                }
                captures.insert(name.as_str(), value);
                true
            }
            Pattern::Absent => value.is_absent(),
            Pattern::Literal(expected) => value == expected,
            Pattern::Record { shape, fields } => match value {
                Value::Record {
                    shape: actual,
                    fields: values,
                } if actual == shape => fields.iter().all(|(name, sub)| {
                    values
                        .get(name)
                        .is_some_and(|field_value| sub.matches(field_value, captures))
                }),
                _ => false,
            },
        }
    }

    /// Names bound anywhere in the pattern, in depth-first order.
    /// Duplicates are kept so callers can detect them.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Bind(name) => out.push(name),
            Pattern::Record { fields, .. } => {
                for (_, sub) in fields {
                    sub.collect_names(out);
                }
            }
            Pattern::Any | Pattern::Absent | Pattern::Literal(_) => {}
        }
    }
}

/// Builder for [`Pattern::Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPattern {
    shape: String,
    fields: Vec<(String, Pattern)>,
}

impl RecordPattern {
    /// Destructure `name` with a sub-pattern.
    pub fn field(mut self, name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        self.fields.push((name.into(), pattern.into()));
        self
    }

    /// Bind field `name` to the variable `var`.
    pub fn bind(self, name: impl Into<String>, var: impl Into<String>) -> Self {
        self.field(name, Pattern::Bind(var.into()))
    }
}

impl From<RecordPattern> for Pattern {
    fn from(p: RecordPattern) -> Pattern {
        Pattern::Record {
            shape: p.shape,
            fields: p.fields,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn usage(region: &str, tier: &str, qty: i64) -> Value {
        Value::record(
            "Usage",
            [
                (
                    "resource",
                    Value::record(
                        "Resource",
                        [
                            ("type", Value::from("VM")),
                            (
                                "identity",
                                Value::record(
                                    "Identity",
                                    [("region", Value::from(region)), ("tier", Value::from(tier))],
                                ),
                            ),
                        ],
                    ),
                ),
                ("quantity", Value::Decimal(Decimal::from(qty))),
            ],
        )
    }

    fn usage_pattern() -> Pattern {
        Pattern::record("Usage")
            .field(
                "resource",
                Pattern::record("Resource").field(
                    "identity",
                    Pattern::record("Identity")
                        .bind("region", "region")
                        .bind("tier", "tier"),
                ),
            )
            .bind("quantity", "qty")
            .into()
    }

    #[test]
    fn nested_destructuring_binds_deep_fields() {
        let value = usage("EU", "PREMIUM", 100);
        let pattern = usage_pattern();
        let mut captures = Captures::new();
        assert!(pattern.matches(&value, &mut captures));
        assert_eq!(captures["region"], &Value::from("EU"));
        assert_eq!(captures["tier"], &Value::from("PREMIUM"));
        assert_eq!(captures["qty"], &Value::Decimal(Decimal::from(100)));
        assert_eq!(captures.len(), 3);
    }

    #[test]
    fn wrong_shape_does_not_match() {
        let value = Value::record("File", [("size", Value::Int(1))]);
        assert!(!usage_pattern().matches(&value, &mut Captures::new()));
    }

    #[test]
    fn nested_literal_restricts_match() {
        let pattern: Pattern = Pattern::record("Usage")
            .field(
                "resource",
                Pattern::record("Resource").field(
                    "identity",
                    Pattern::record("Identity").field("region", Pattern::literal("EU")),
                ),
            )
            .into();
        let eu = usage("EU", "STANDARD", 1);
        let us = usage("US", "STANDARD", 1);
        assert!(pattern.matches(&eu, &mut Captures::new()));
        assert!(!pattern.matches(&us, &mut Captures::new()));
    }

    #[test]
    fn missing_field_does_not_match() {
        let value = Value::record("Usage", [("quantity", Value::Int(1))]);
        let pattern: Pattern = Pattern::record("Usage").bind("resource", "r").into();
        let mut captures = Captures::new();
        assert!(!pattern.matches(&value, &mut captures));
    }

    #[test]
    fn any_and_bind_reject_absent() {
        let absent = Value::Absent;
        let zero = Value::Int(0);
        let (any, bind, marker) = (Pattern::any(), Pattern::bind("x"), Pattern::absent());
        let mut captures = Captures::new();
        assert!(!any.matches(&absent, &mut captures));
        assert!(!bind.matches(&absent, &mut captures));
        assert!(marker.matches(&absent, &mut captures));
        assert!(!marker.matches(&zero, &mut captures));
        assert!(captures.is_empty());
    }

    #[test]
    fn bind_captures_whole_value() {
        let value = usage("US", "STANDARD", 5);
        let pattern = Pattern::bind("u");
        let mut captures = Captures::new();
        assert!(pattern.matches(&value, &mut captures));
        assert_eq!(captures["u"], &value);
    }

    #[test]
    fn bound_names_in_order_with_duplicates() {
        let pattern: Pattern = Pattern::record("Pair")
            .bind("left", "x")
            .field("right", Pattern::record("Inner").bind("v", "x"))
            .into();
        assert_eq!(pattern.bound_names(), vec!["x", "x"]);
        assert_eq!(usage_pattern().bound_names(), vec!["region", "tier", "qty"]);
    }
}
