//! Names bound by a matched pattern, as seen by guards and producers.
//!
//! Lookups accept a dotted path: `"user.age"` reads field `age` of the
//! record bound to `user`. Accessors fail with `UnboundVariable` for unknown
//! names and `TypeError` for values of the wrong kind.

use rust_decimal::Decimal;
use shapecase_core::{Captures, Value};

use crate::error::MatchError;

#[derive(Debug, Clone)]
pub struct Bindings<'a> {
    captures: Captures<'a>,
}

impl<'a> Bindings<'a> {
    pub fn new(captures: Captures<'a>) -> Self {
        Bindings { captures }
    }

    /// Resolve a name or dotted field path to a value.
    pub fn get(&self, path: &str) -> Result<&'a Value, MatchError> {
        let mut parts = path.split('.');
        let head = parts.next().unwrap_or_default();
        let mut value: &'a Value =
            self.captures
                .get(head)
                .copied()
                .ok_or_else(|| MatchError::UnboundVariable {
                    name: head.to_string(),
                })?;
        for field in parts {
            value = match value {
                Value::Record { fields, .. } => {
                    fields
                        .get(field)
                        .ok_or_else(|| MatchError::UnboundVariable {
                            name: path.to_string(),
                        })?
                }
                other => return Err(type_error(path, "Record", other)),
            };
        }
        Ok(value)
    }

    pub fn text(&self, path: &str) -> Result<&'a str, MatchError> {
        let value = self.get(path)?;
        value.as_text().ok_or_else(|| type_error(path, "Text", value))
    }

    pub fn int(&self, path: &str) -> Result<i64, MatchError> {
        let value = self.get(path)?;
        value.as_int().ok_or_else(|| type_error(path, "Int", value))
    }

    /// Decimals, with integers widened.
    pub fn decimal(&self, path: &str) -> Result<Decimal, MatchError> {
        let value = self.get(path)?;
        value
            .as_decimal()
            .ok_or_else(|| type_error(path, "Decimal", value))
    }

    pub fn bool(&self, path: &str) -> Result<bool, MatchError> {
        let value = self.get(path)?;
        value.as_bool().ok_or_else(|| type_error(path, "Bool", value))
    }

    pub fn list(&self, path: &str) -> Result<&'a [Value], MatchError> {
        let value = self.get(path)?;
        value.as_list().ok_or_else(|| type_error(path, "List", value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.captures.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.captures.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

fn type_error(path: &str, expected: &'static str, found: &Value) -> MatchError {
    MatchError::TypeError {
        name: path.to_string(),
        expected,
        found: found.type_name(),
    }
}
