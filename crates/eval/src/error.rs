use shapecase_core::ConfigError;

/// Errors that can occur while evaluating a value against a matcher.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No rule matched an admitted value. Built tables cover every value
    /// that conforms to the schema, so this is only reachable through
    /// [`Nested::evaluate`](crate::Nested::evaluate) on a value a producer
    /// built itself. Never a default.
    #[error("no rule matched a value of shape '{shape}' in domain '{domain}'")]
    NoMatch { domain: String, shape: String },

    /// The value is outside the declared closed domain, or a member shape
    /// whose fields do not conform to their declaration. `message` starts
    /// with the offending path.
    #[error("malformed input for domain '{domain}': {message}")]
    MalformedInput { domain: String, message: String },

    /// A guard or producer asked for a name the pattern does not bind.
    #[error("unbound variable: {name}")]
    UnboundVariable { name: String },

    /// A bound value does not have the kind a guard or producer asked for.
    #[error("type error: '{name}' expected {expected}, got {found}")]
    TypeError {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Numeric overflow in a producer.
    #[error("numeric overflow: {message}")]
    Overflow { message: String },

    /// A guard or producer failed with its own error.
    #[error("rule '{rule}' failed: {source}")]
    Rule {
        rule: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Building the matcher failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl MatchError {
    /// Wrap an error raised inside a guard or producer.
    pub fn rule(
        rule: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        MatchError::Rule {
            rule: rule.into(),
            source: source.into(),
        }
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        MatchError::Overflow {
            message: message.into(),
        }
    }
}
