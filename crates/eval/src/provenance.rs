//! Provenance records for match tracing.
//!
//! A traced evaluation records which rule produced the result and, in
//! order, every earlier rule that was tried and why it was passed over.

use std::fmt;

/// Why a rule was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The value's shape did not match the rule's pattern.
    ShapeMismatch,
    /// The pattern matched but the guard returned false.
    GuardFailed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ShapeMismatch => write!(f, "shape_mismatch"),
            Rejection::GuardFailed => write!(f, "guard_failed"),
        }
    }
}

/// A rule that was tried and passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRejection {
    pub rule_id: String,
    pub index: usize,
    pub reason: Rejection,
}

/// Provenance record for a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchProvenance {
    /// The domain the matcher evaluates.
    pub domain: String,
    /// The rule id that produced the result.
    pub rule_id: String,
    /// Position of that rule in declaration order.
    pub rule_index: usize,
    /// Rules tried before it, in order.
    pub rejected: Vec<RuleRejection>,
}

impl MatchProvenance {
    pub fn to_json(&self) -> serde_json::Value {
        let rejected: Vec<serde_json::Value> = self
            .rejected
            .iter()
            .map(|r| {
                serde_json::json!({
                    "rule": r.rule_id,
                    "index": r.index,
                    "reason": r.reason.to_string(),
                })
            })
            .collect();
        serde_json::json!({
            "domain": self.domain,
            "rule": self.rule_id,
            "index": self.rule_index,
            "rejected": rejected,
        })
    }
}

/// A result together with the provenance of the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Traced<R> {
    pub value: R,
    pub provenance: MatchProvenance,
}

/// Collects rejected rules during evaluation. A disabled collector records
/// nothing, so untraced evaluation does not allocate.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceCollector {
    enabled: bool,
    rejected: Vec<RuleRejection>,
}

impl ProvenanceCollector {
    pub fn new() -> Self {
        ProvenanceCollector {
            enabled: true,
            rejected: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        ProvenanceCollector::default()
    }

    /// Record a rule that was passed over.
    pub fn record_rejection(&mut self, rule_id: &str, index: usize, reason: Rejection) {
        if self.enabled {
            self.rejected.push(RuleRejection {
                rule_id: rule_id.to_string(),
                index,
                reason,
            });
        }
    }

    /// Finalize into a MatchProvenance.
    pub fn into_provenance(self, domain: &str, rule_id: &str, rule_index: usize) -> MatchProvenance {
        MatchProvenance {
            domain: domain.to_string(),
            rule_id: rule_id.to_string(),
            rule_index,
            rejected: self.rejected,
        }
    }
}
