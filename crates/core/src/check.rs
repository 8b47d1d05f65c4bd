//! Static checks over an ordered rule table.
//!
//! Run once when a matcher is built:
//! 1. every pattern is well-formed against the schema (shapes, fields,
//!    literal kinds, binding names);
//! 2. no rule is shadowed by earlier unguarded rules;
//! 3. every member of the closed domain is covered by an unguarded rule.
//!
//! Coverage is conservative. Only rules without a guard count, and a rule
//! covers a member only if its pattern matches every value of that member
//! (binds, wildcards, and records of the field's single declared shape).
//! Guards and literals never make a table exhaustive on their own: a table
//! that relies on them must end with an unguarded fallback. Neither does
//! splitting a nested field of a multi-member variant kind across rules:
//! a nested record pattern only covers its field when the field's kind
//! admits exactly that one shape, so such a field needs a bind or wildcard
//! in some unguarded rule.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;
use crate::pattern::Pattern;
use crate::schema::{FieldKind, Member, RecordDecl, Schema, VariantDomain};
use crate::value::Value;

/// The parts of a rule the checks look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleShape<'a> {
    pub id: &'a str,
    pub pattern: &'a Pattern,
    pub guarded: bool,
}

/// Which rule first covers each member of the domain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Coverage(pub BTreeMap<Member, String>);

impl Coverage {
    /// The id of the rule that catches every value of `member`.
    pub fn rule_for(&self, member: &Member) -> Option<&str> {
        self.0.get(member).map(String::as_str)
    }
}

/// Check an ordered rule table against a domain. Returns the coverage map.
pub fn check_rules(
    schema: &Schema,
    domain: &VariantDomain,
    rules: &[RuleShape<'_>],
) -> Result<Coverage, ConfigError> {
    let mut seen_ids = BTreeSet::new();
    for rule in rules {
        if !seen_ids.insert(rule.id) {
            return Err(ConfigError::DuplicateRule {
                rule: rule.id.to_string(),
            });
        }
        check_pattern(schema, domain, rule.id, rule.pattern)?;
        check_bindings(rule.id, rule.pattern)?;
    }

    let mut coverage = Coverage::default();
    for rule in rules {
        let candidates = candidate_members(domain, rule.pattern);
        if !candidates.is_empty() && candidates.iter().all(|m| coverage.0.contains_key(m)) {
            let shadowed_by = coverage.0[&candidates[0]].clone();
            return Err(ConfigError::UnreachableRule {
                rule: rule.id.to_string(),
                shadowed_by,
            });
        }
        if rule.guarded {
            continue;
        }
        for member in covered_members(schema, domain, rule.pattern) {
            coverage
                .0
                .entry(member)
                .or_insert_with(|| rule.id.to_string());
        }
    }

    let missing: Vec<String> = domain
        .members()
        .into_iter()
        .filter(|m| !coverage.0.contains_key(m))
        .map(|m| m.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::NonExhaustive {
            domain: domain.name.clone(),
            missing,
        });
    }

    Ok(coverage)
}

// ──────────────────────────────────────────────
// Well-formedness
// ──────────────────────────────────────────────

/// Check a top-level pattern against the domain it is matched over.
pub fn check_pattern(
    schema: &Schema,
    domain: &VariantDomain,
    rule: &str,
    pattern: &Pattern,
) -> Result<(), ConfigError> {
    match pattern {
        Pattern::Any | Pattern::Bind(_) => Ok(()),
        Pattern::Absent | Pattern::Literal(Value::Absent) => {
            if domain.allows_absent {
                Ok(())
            } else {
                Err(ConfigError::AbsentNotAllowed {
                    rule: rule.to_string(),
                    path: domain.name.clone(),
                })
            }
        }
        Pattern::Literal(value) => match value.shape() {
            Some(shape) if domain.contains_shape(shape) => Ok(()),
            Some(shape) => Err(not_in_domain(rule, shape, domain)),
            None => Err(ConfigError::KindMismatch {
                rule: rule.to_string(),
                path: domain.name.clone(),
                pattern: value.type_name().to_string(),
                field: format!("one of {}", domain.name),
            }),
        },
        Pattern::Record { shape, fields } => {
            if !domain.contains_shape(shape) {
                // Distinguish typos from shapes that exist elsewhere.
                if schema.record(shape).is_none() {
                    return Err(unknown_shape(rule, shape));
                }
                return Err(not_in_domain(rule, shape, domain));
            }
            let decl = schema.record(shape).ok_or_else(|| unknown_shape(rule, shape))?;
            check_fields(schema, rule, shape, decl, fields)
        }
    }
}

fn check_fields(
    schema: &Schema,
    rule: &str,
    path: &str,
    decl: &RecordDecl,
    fields: &[(String, Pattern)],
) -> Result<(), ConfigError> {
    for (name, sub) in fields {
        let kind = decl
            .fields
            .get(name)
            .ok_or_else(|| ConfigError::UnknownField {
                rule: rule.to_string(),
                shape: decl.shape.clone(),
                field: name.clone(),
            })?;
        let sub_path = format!("{}.{}", path, name);
        check_against_kind(schema, rule, &sub_path, kind, sub)?;
    }
    Ok(())
}

fn check_against_kind(
    schema: &Schema,
    rule: &str,
    path: &str,
    kind: &FieldKind,
    pattern: &Pattern,
) -> Result<(), ConfigError> {
    match pattern {
        Pattern::Any | Pattern::Bind(_) => Ok(()),
        Pattern::Absent => Err(ConfigError::AbsentNotAllowed {
            rule: rule.to_string(),
            path: path.to_string(),
        }),
        Pattern::Literal(value) => {
            if kind.admits(value) {
                Ok(())
            } else {
                Err(kind_mismatch(rule, path, kind, value.type_name()))
            }
        }
        Pattern::Record { shape, fields } => {
            let allowed = match kind {
                FieldKind::Record(expected) => expected == shape,
                FieldKind::Variant(name) => schema
                    .domain(name)
                    .is_some_and(|d| d.contains_shape(shape)),
                _ => false,
            };
            if !allowed {
                return Err(kind_mismatch(rule, path, kind, shape));
            }
            let decl = schema.record(shape).ok_or_else(|| unknown_shape(rule, shape))?;
            check_fields(schema, rule, path, decl, fields)
        }
    }
}

fn check_bindings(rule: &str, pattern: &Pattern) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for name in pattern.bound_names() {
        if name.is_empty() || name.contains('.') {
            return Err(ConfigError::InvalidBinding {
                rule: rule.to_string(),
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateBinding {
                rule: rule.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn unknown_shape(rule: &str, shape: &str) -> ConfigError {
    ConfigError::UnknownShape {
        rule: rule.to_string(),
        shape: shape.to_string(),
    }
}

fn not_in_domain(rule: &str, shape: &str, domain: &VariantDomain) -> ConfigError {
    ConfigError::ShapeNotInDomain {
        rule: rule.to_string(),
        shape: shape.to_string(),
        domain: domain.name.clone(),
    }
}

fn kind_mismatch(rule: &str, path: &str, kind: &FieldKind, found: &str) -> ConfigError {
    ConfigError::KindMismatch {
        rule: rule.to_string(),
        path: path.to_string(),
        pattern: found.to_string(),
        field: kind.to_string(),
    }
}

// ──────────────────────────────────────────────
// Coverage
// ──────────────────────────────────────────────

/// Members a top-level pattern could match at all.
fn candidate_members(domain: &VariantDomain, pattern: &Pattern) -> Vec<Member> {
    match pattern {
        Pattern::Any | Pattern::Bind(_) => domain.present_members(),
        Pattern::Absent | Pattern::Literal(Value::Absent) => vec![Member::Absent],
        Pattern::Literal(value) => value
            .shape()
            .map(|s| vec![Member::Shape(s.to_string())])
            .unwrap_or_default(),
        Pattern::Record { shape, .. } => vec![Member::Shape(shape.clone())],
    }
}

/// Members a top-level pattern matches every value of.
fn covered_members(schema: &Schema, domain: &VariantDomain, pattern: &Pattern) -> Vec<Member> {
    match pattern {
        Pattern::Any | Pattern::Bind(_) => domain.present_members(),
        Pattern::Absent | Pattern::Literal(Value::Absent) => vec![Member::Absent],
        Pattern::Literal(_) => Vec::new(),
        Pattern::Record { shape, fields } => {
            if fields_irrefutable(schema, shape, fields) {
                vec![Member::Shape(shape.clone())]
            } else {
                Vec::new()
            }
        }
    }
}

fn fields_irrefutable(schema: &Schema, shape: &str, fields: &[(String, Pattern)]) -> bool {
    let Some(decl) = schema.record(shape) else {
        return false;
    };
    fields.iter().all(|(name, sub)| {
        decl.fields
            .get(name)
            .is_some_and(|kind| irrefutable(schema, kind, sub))
    })
}

/// Whether `pattern` matches every value of `kind`.
fn irrefutable(schema: &Schema, kind: &FieldKind, pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Any | Pattern::Bind(_) => true,
        Pattern::Absent | Pattern::Literal(_) => false,
        Pattern::Record { shape, fields } => {
            let single_shape = match kind {
                FieldKind::Record(expected) => expected == shape,
                FieldKind::Variant(name) => schema.domain(name).is_some_and(|d| {
                    !d.allows_absent && d.shapes.len() == 1 && d.contains_shape(shape)
                }),
                _ => false,
            };
            single_shape && fields_irrefutable(schema, shape, fields)
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
