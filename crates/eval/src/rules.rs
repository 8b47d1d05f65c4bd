//! Ordered rule tables and the builder that checks them.
//!
//! A rule is a shape pattern, an optional guard over the names the pattern
//! binds, and a producer computing the result. Rules are declared in the
//! order they are tried; `build()` runs the static checks from
//! `shapecase_core::check` and freezes the table into a [`Matcher`].

use shapecase_core::{check_rules, ClosedVariant, ConfigError, Pattern, RuleShape, Schema};

use crate::bindings::Bindings;
use crate::error::MatchError;
use crate::matcher::{Matcher, Nested};

/// Side-effect-free predicate over bound names.
pub type Guard = Box<dyn Fn(&Bindings<'_>) -> Result<bool, MatchError> + Send + Sync>;

/// Computes a result from bound names. The [`Nested`] handle lets producers
/// evaluate sub-values of the same domain.
pub type Producer<R> =
    Box<dyn Fn(&Bindings<'_>, &Nested<'_, R>) -> Result<R, MatchError> + Send + Sync>;

pub struct Rule<R> {
    pub(crate) id: String,
    pub(crate) pattern: Pattern,
    pub(crate) guard: Option<Guard>,
    pub(crate) produce: Producer<R>,
}

impl<R> Rule<R> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }
}

impl<R> std::fmt::Debug for Rule<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Builds an ordered rule table for one closed domain.
pub struct MatcherBuilder<R> {
    schema: Schema,
    domain: String,
    rules: Vec<Rule<R>>,
}

impl<R> MatcherBuilder<R> {
    pub fn new(schema: Schema, domain: impl Into<String>) -> Self {
        MatcherBuilder {
            schema,
            domain: domain.into(),
            rules: Vec::new(),
        }
    }

    /// Start a builder over the schema declared by a typed closed variant.
    pub fn for_variant<T: ClosedVariant>() -> Result<Self, ConfigError> {
        Ok(MatcherBuilder::new(Schema::for_variant::<T>()?, T::DOMAIN))
    }

    /// Append a rule. Finish it with [`RuleBuilder::then`] or
    /// [`RuleBuilder::yields`].
    pub fn rule(self, id: impl Into<String>, pattern: impl Into<Pattern>) -> RuleBuilder<R> {
        RuleBuilder {
            parent: self,
            id: id.into(),
            pattern: pattern.into(),
            guard: None,
        }
    }

    /// Check the table and freeze it.
    pub fn build(self) -> Result<Matcher<R>, ConfigError> {
        self.schema.validate()?;
        let domain = self
            .schema
            .domain(&self.domain)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDomain {
                domain: self.domain.clone(),
            })?;
        let shapes: Vec<RuleShape<'_>> = self
            .rules
            .iter()
            .map(|r| RuleShape {
                id: &r.id,
                pattern: &r.pattern,
                guarded: r.guard.is_some(),
            })
            .collect();
        let coverage = check_rules(&self.schema, &domain, &shapes)?;
        Ok(Matcher::new(self.schema, domain, self.rules, coverage))
    }
}

/// A rule under construction.
pub struct RuleBuilder<R> {
    parent: MatcherBuilder<R>,
    id: String,
    pattern: Pattern,
    guard: Option<Guard>,
}

impl<R> RuleBuilder<R> {
    /// Attach a guard. Calling `when` again requires both guards to hold.
    pub fn when<F>(mut self, guard: F) -> Self
    where
        F: Fn(&Bindings<'_>) -> Result<bool, MatchError> + Send + Sync + 'static,
    {
        let combined: Guard = match self.guard.take() {
            None => Box::new(guard),
            Some(first) => Box::new(move |b: &Bindings<'_>| -> Result<bool, MatchError> {
                Ok(first(b)? && guard(b)?)
            }),
        };
        self.guard = Some(combined);
        self
    }

    /// Finish the rule with a producer.
    pub fn then<F>(self, produce: F) -> MatcherBuilder<R>
    where
        F: Fn(&Bindings<'_>, &Nested<'_, R>) -> Result<R, MatchError> + Send + Sync + 'static,
    {
        let RuleBuilder {
            mut parent,
            id,
            pattern,
            guard,
        } = self;
        parent.rules.push(Rule {
            id,
            pattern,
            guard,
            produce: Box::new(produce),
        });
        parent
    }

    /// Finish the rule with a constant result.
    pub fn yields(self, value: R) -> MatcherBuilder<R>
    where
        R: Clone + Send + Sync + 'static,
    {
        self.then(move |_, _| Ok(value.clone()))
    }
}
