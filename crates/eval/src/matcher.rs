//! First-match-wins evaluation of a frozen rule table.
//!
//! A value is first admitted: it must be a member of the closed domain and
//! conform to its declared shape. Then, for each rule in declaration order:
//! 1. match the value against the rule's pattern, collecting bindings
//! 2. if the shape matches, evaluate the guard (absent guard = true)
//! 3. if the guard holds, return the producer's result
//!
//! Matchers hold no mutable state and can be shared across threads.

use shapecase_core::{Captures, Coverage, Schema, Shaped, Value, VariantDomain};

use crate::bindings::Bindings;
use crate::error::MatchError;
use crate::provenance::{ProvenanceCollector, Rejection, Traced};
use crate::rules::Rule;

/// How much of a value is checked before rules are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Domain membership and full conformance to the schema.
    Full,
    /// Domain membership only. For sub-values of an admitted value, which
    /// conformed as part of their parent.
    Member,
}

pub struct Matcher<R> {
    schema: Schema,
    domain: VariantDomain,
    rules: Vec<Rule<R>>,
    coverage: Coverage,
}

impl<R> Matcher<R> {
    pub(crate) fn new(
        schema: Schema,
        domain: VariantDomain,
        rules: Vec<Rule<R>>,
        coverage: Coverage,
    ) -> Self {
        Matcher {
            schema,
            domain,
            rules,
            coverage,
        }
    }

    /// Evaluate a value, returning the first matching rule's result.
    pub fn evaluate(&self, value: &Value) -> Result<R, MatchError> {
        let mut collector = ProvenanceCollector::disabled();
        self.run(value, Admission::Full, &mut collector)
            .map(|(result, _)| result)
    }

    /// Lower a typed value and evaluate it.
    pub fn evaluate_shaped<T: Shaped + ?Sized>(&self, input: &T) -> Result<R, MatchError> {
        self.evaluate(&input.to_value())
    }

    /// Evaluate a value and record which rule produced the result.
    pub fn evaluate_traced(&self, value: &Value) -> Result<Traced<R>, MatchError> {
        let mut collector = ProvenanceCollector::new();
        let (result, index) = self.run(value, Admission::Full, &mut collector)?;
        let provenance = collector.into_provenance(&self.domain.name, &self.rules[index].id, index);
        Ok(Traced {
            value: result,
            provenance,
        })
    }

    fn run(
        &self,
        value: &Value,
        admission: Admission,
        collector: &mut ProvenanceCollector,
    ) -> Result<(R, usize), MatchError> {
        self.admit(value, admission)?;

        for (index, rule) in self.rules.iter().enumerate() {
            let mut captures = Captures::new();
            if !rule.pattern.matches(value, &mut captures) {
                collector.record_rejection(&rule.id, index, Rejection::ShapeMismatch);
                continue;
            }
            let bindings = Bindings::new(captures);
            if let Some(guard) = &rule.guard {
                if !guard(&bindings)? {
                    collector.record_rejection(&rule.id, index, Rejection::GuardFailed);
                    continue;
                }
            }
            let result = (rule.produce)(&bindings, &Nested { matcher: self })?;
            return Ok((result, index));
        }

        Err(MatchError::NoMatch {
            domain: self.domain.name.clone(),
            shape: value.shape().unwrap_or("Absent").to_string(),
        })
    }

    /// Reject values outside the closed domain, or not shaped as declared,
    /// before trying any rule.
    fn admit(&self, value: &Value, admission: Admission) -> Result<(), MatchError> {
        let message = match value {
            Value::Absent if self.domain.allows_absent => return Ok(()),
            Value::Absent => "absent value in a domain without an absent marker".to_string(),
            Value::Record { shape, .. } if self.domain.contains_shape(shape) => {
                if admission == Admission::Member {
                    return Ok(());
                }
                match self.schema.conform(value) {
                    Ok(()) => return Ok(()),
                    Err(nonconformance) => nonconformance.to_string(),
                }
            }
            Value::Record { shape, .. } => format!("shape '{}' is not a member", shape),
            other => format!("expected a record, got {}", other.type_name()),
        };
        Err(MatchError::MalformedInput {
            domain: self.domain.name.clone(),
            message,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn domain(&self) -> &VariantDomain {
        &self.domain
    }

    pub fn rules(&self) -> &[Rule<R>] {
        &self.rules
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    /// Which unguarded rule catches each member of the domain.
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }
}

impl<R> std::fmt::Debug for Matcher<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("domain", &self.domain.name)
            .field("rules", &self.rules)
            .finish()
    }
}

/// Handle given to producers for evaluating sub-values of the value being
/// matched against the same table.
///
/// Sub-values conformed when their parent was admitted, so only their domain
/// membership is checked again. This keeps recursive evaluation linear in
/// the size of the input.
pub struct Nested<'m, R> {
    matcher: &'m Matcher<R>,
}

impl<R> Nested<'_, R> {
    pub fn evaluate(&self, value: &Value) -> Result<R, MatchError> {
        let mut collector = ProvenanceCollector::disabled();
        self.matcher
            .run(value, Admission::Member, &mut collector)
            .map(|(result, _)| result)
    }

    pub fn matcher(&self) -> &Matcher<R> {
        self.matcher
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
