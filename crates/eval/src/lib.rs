//! Shapecase guarded match evaluator -- evaluates a value of a closed
//! variant domain against an ordered table of guarded shape rules.
//!
//! Tables are declared with [`MatcherBuilder`], checked once for
//! exhaustiveness and reachability, and frozen into an immutable
//! [`Matcher`]. Evaluation is first-match-wins: rules are tried in
//! declaration order and the first whose pattern and guard both hold
//! produces the result.
//!
//! ```
//! use shapecase_core::{FieldKind, Pattern, RecordDecl, Schema, Value, VariantDomain};
//! use shapecase_eval::MatcherBuilder;
//!
//! let mut schema = Schema::new();
//! schema.declare_record(RecordDecl::new("Reading").field("celsius", FieldKind::Int))?;
//! schema.declare_domain(VariantDomain::new("Sensor").member("Reading").with_absent())?;
//!
//! let matcher = MatcherBuilder::new(schema, "Sensor")
//!     .rule("freezing", Pattern::record("Reading").bind("celsius", "c"))
//!     .when(|b| Ok(b.int("c")? <= 0))
//!     .yields("freezing")
//!     .rule("above_zero", Pattern::record("Reading"))
//!     .yields("above zero")
//!     .rule("offline", Pattern::absent())
//!     .yields("offline")
//!     .build()?;
//!
//! let reading = Value::record("Reading", [("celsius", Value::Int(-4))]);
//! assert_eq!(matcher.evaluate(&reading)?, "freezing");
//! assert_eq!(matcher.evaluate(&Value::Absent)?, "offline");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bindings;
pub mod error;
pub mod matcher;
pub mod provenance;
pub mod rules;

pub use bindings::Bindings;
pub use error::MatchError;
pub use matcher::{Matcher, Nested};
pub use provenance::{MatchProvenance, ProvenanceCollector, Rejection, RuleRejection, Traced};
pub use rules::{Guard, MatcherBuilder, Producer, Rule, RuleBuilder};
