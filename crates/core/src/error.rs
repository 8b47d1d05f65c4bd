/// Defects in a schema or rule table, reported when a matcher is built.
///
/// None of these are runtime conditions: a table that produces one of them
/// never reaches evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The matcher names a variant domain the schema does not declare.
    #[error("unknown variant domain: {domain}")]
    UnknownDomain { domain: String },

    /// A record shape or domain was declared twice with different contents.
    #[error("conflicting declarations for '{name}'")]
    ConflictingDeclaration { name: String },

    /// A declaration refers to a record shape or domain that was never declared.
    #[error("'{owner}' refers to undeclared '{target}'")]
    UndeclaredReference { owner: String, target: String },

    /// A pattern names a record shape the schema does not declare.
    #[error("rule '{rule}': unknown shape '{shape}'")]
    UnknownShape { rule: String, shape: String },

    /// A top-level pattern names a shape outside the matcher's closed domain.
    #[error("rule '{rule}': shape '{shape}' is not a member of domain '{domain}'")]
    ShapeNotInDomain {
        rule: String,
        shape: String,
        domain: String,
    },

    /// A record pattern destructures a field its shape does not have.
    #[error("rule '{rule}': shape '{shape}' has no field '{field}'")]
    UnknownField {
        rule: String,
        shape: String,
        field: String,
    },

    /// A sub-pattern can never match the declared kind of its field.
    #[error("rule '{rule}': pattern at '{path}' expects {pattern}, field is {field}")]
    KindMismatch {
        rule: String,
        path: String,
        /// What the pattern can match.
        pattern: String,
        /// The declared kind at that path.
        field: String,
    },

    /// An absent pattern where no absent value can occur.
    #[error("rule '{rule}': absent pattern is not allowed at '{path}'")]
    AbsentNotAllowed { rule: String, path: String },

    /// A pattern binds the same name more than once.
    #[error("rule '{rule}': '{name}' is bound more than once")]
    DuplicateBinding { rule: String, name: String },

    /// Binding names must be non-empty and free of '.', which separates
    /// field paths in binding lookups.
    #[error("rule '{rule}': invalid binding name '{name}'")]
    InvalidBinding { rule: String, name: String },

    /// Two rules share an id.
    #[error("duplicate rule id: {rule}")]
    DuplicateRule { rule: String },

    /// Some members of the domain are not covered by any unguarded rule.
    #[error("rules for domain '{domain}' are not exhaustive, missing: {}", .missing.join(", "))]
    NonExhaustive {
        domain: String,
        missing: Vec<String>,
    },

    /// Every value the rule could match is claimed by an earlier rule.
    #[error("rule '{rule}' is unreachable, shadowed by '{shadowed_by}'")]
    UnreachableRule { rule: String, shadowed_by: String },
}
