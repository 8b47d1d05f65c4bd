//! shapecase-core: the variant model behind guarded shape matching.
//!
//! Provides the value tree that inputs are lowered into, the schema that
//! declares record shapes and closed variant domains, shape patterns, and
//! the static checks run over an ordered rule table before it is used.
//!
//! # Public API
//!
//! - [`Value`] -- immutable structured values with structural equality
//! - [`Schema`], [`RecordDecl`], [`FieldKind`], [`VariantDomain`] -- declarations,
//!   and [`Schema::conform`] for checking values against them
//! - [`Shaped`], [`ClosedVariant`] -- lowering typed records into values
//! - [`Pattern`] -- nested shape patterns that bind sub-values
//! - [`check_rules`] -- exhaustiveness, reachability and well-formedness
//! - [`ConfigError`] -- defects found by the checks

pub mod check;
pub mod error;
pub mod pattern;
pub mod schema;
pub mod value;

pub use check::{check_rules, Coverage, RuleShape};
pub use error::ConfigError;
pub use pattern::{Captures, Pattern, RecordPattern};
pub use schema::{
    ClosedVariant, FieldKind, Member, Nonconformance, RecordDecl, Schema, VariantDomain,
};
pub use value::{Shaped, Value};
