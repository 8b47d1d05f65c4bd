//! Cloud billing: cost of a usage record from its region and tier.
//!
//! Rates, first match wins:
//! - EU region and PREMIUM tier: 0.25 per unit
//! - PREMIUM tier anywhere: 0.20
//! - EU region, any tier: 0.15
//! - everything else: 0.10
//! - absent usage costs nothing
//!
//! The EU+PREMIUM rule has to precede both single-condition rules or it is
//! never reached.

use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shapecase_core::{
    ClosedVariant, ConfigError, FieldKind, Pattern, RecordDecl, Schema, Shaped, Value,
    VariantDomain,
};
use shapecase_eval::{Bindings, MatchError, Matcher, MatcherBuilder, Traced};

use crate::config::Policy;

// ──────────────────────────────────────────────
// Data model
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub region: String,
    pub tier: String,
}

impl Identity {
    pub fn new(region: impl Into<String>, tier: impl Into<String>) -> Self {
        Identity {
            region: region.into(),
            tier: tier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub identity: Identity,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, identity: Identity) -> Self {
        Resource {
            resource_type: resource_type.into(),
            identity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Usage {
    pub resource: Resource,
    pub quantity: Decimal,
}

impl Usage {
    pub fn new(resource: Resource, quantity: Decimal) -> Self {
        Usage { resource, quantity }
    }
}

/// The billing domain: a usage record, or no usage at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingInput {
    Usage(Usage),
    Absent,
}

impl From<Usage> for BillingInput {
    fn from(usage: Usage) -> Self {
        BillingInput::Usage(usage)
    }
}

impl From<Option<Usage>> for BillingInput {
    fn from(usage: Option<Usage>) -> Self {
        usage.map_or(BillingInput::Absent, BillingInput::Usage)
    }
}

impl Shaped for Identity {
    fn to_value(&self) -> Value {
        Value::record(
            "Identity",
            [
                ("region", Value::from(self.region.as_str())),
                ("tier", Value::from(self.tier.as_str())),
            ],
        )
    }
}

impl Shaped for Resource {
    fn to_value(&self) -> Value {
        Value::record(
            "Resource",
            [
                ("type", Value::from(self.resource_type.as_str())),
                ("identity", self.identity.to_value()),
            ],
        )
    }
}

impl Shaped for Usage {
    fn to_value(&self) -> Value {
        Value::record(
            "Usage",
            [
                ("resource", self.resource.to_value()),
                ("quantity", Value::Decimal(self.quantity)),
            ],
        )
    }
}

impl Shaped for BillingInput {
    fn to_value(&self) -> Value {
        match self {
            BillingInput::Usage(usage) => usage.to_value(),
            BillingInput::Absent => Value::Absent,
        }
    }
}

impl ClosedVariant for BillingInput {
    const DOMAIN: &'static str = "Billing";

    fn declare(schema: &mut Schema) -> Result<(), ConfigError> {
        schema.declare_record(
            RecordDecl::new("Identity")
                .field("region", FieldKind::Text)
                .field("tier", FieldKind::Text),
        )?;
        schema.declare_record(
            RecordDecl::new("Resource")
                .field("type", FieldKind::Text)
                .field("identity", FieldKind::Record("Identity".into())),
        )?;
        schema.declare_record(
            RecordDecl::new("Usage")
                .field("resource", FieldKind::Record("Resource".into()))
                .field("quantity", FieldKind::Decimal),
        )?;
        schema.declare_domain(VariantDomain::new(Self::DOMAIN).member("Usage").with_absent())
    }
}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

/// Per-unit rates and the region/tier codes they key on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingRates {
    pub eu_premium: Decimal,
    pub premium: Decimal,
    pub eu: Decimal,
    pub base: Decimal,
    pub eu_region: String,
    pub premium_tier: String,
}

impl Default for BillingRates {
    fn default() -> Self {
        BillingRates {
            eu_premium: Decimal::new(25, 2),
            premium: Decimal::new(20, 2),
            eu: Decimal::new(15, 2),
            base: Decimal::new(10, 2),
            eu_region: "EU".to_string(),
            premium_tier: "PREMIUM".to_string(),
        }
    }
}

impl Policy for BillingRates {}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

/// `Usage { resource: Resource { identity: Identity { region, tier } }, quantity }`
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

fn charge(b: &Bindings<'_>, rate: Decimal) -> Result<Decimal, MatchError> {
    let qty = b.decimal("qty")?;
    qty.checked_mul(rate)
        .ok_or_else(|| MatchError::overflow(format!("{} * {}", qty, rate)))
}

/// Computes usage cost from a fixed, ordered rate table.
#[derive(Debug)]
pub struct BillingEngine {
    rates: BillingRates,
    matcher: Matcher<Decimal>,
}

impl BillingEngine {
    /// Engine with the default rates.
    pub fn new() -> Result<Self, ConfigError> {
        BillingEngine::with_rates(BillingRates::default())
    }

    pub fn with_rates(rates: BillingRates) -> Result<Self, ConfigError> {
        let BillingRates {
            eu_premium,
            premium,
            eu,
            base,
            eu_region,
            premium_tier,
        } = rates.clone();
        let (region_a, tier_a) = (eu_region.clone(), premium_tier.clone());
        let tier_b = premium_tier;
        let region_c = eu_region;

        let matcher = MatcherBuilder::for_variant::<BillingInput>()?
            .rule("eu_premium", usage_pattern())
            .when(move |b| Ok(b.text("region")? == region_a && b.text("tier")? == tier_a))
            .then(move |b, _| charge(b, eu_premium))
            .rule("premium", usage_pattern())
            .when(move |b| Ok(b.text("tier")? == tier_b))
            .then(move |b, _| charge(b, premium))
            .rule("eu", usage_pattern())
            .when(move |b| Ok(b.text("region")? == region_c))
            .then(move |b, _| charge(b, eu))
            .rule("base", usage_pattern())
            .then(move |b, _| charge(b, base))
            .rule("absent", Pattern::absent())
            .yields(Decimal::ZERO)
            .build()?;

        Ok(BillingEngine { rates, matcher })
    }

    pub fn evaluate_cost(&self, input: &BillingInput) -> Result<Decimal, MatchError> {
        self.matcher.evaluate_shaped(input)
    }

    /// Cost plus the rule that priced it.
    pub fn evaluate_cost_traced(&self, input: &BillingInput) -> Result<Traced<Decimal>, MatchError> {
        self.matcher.evaluate_traced(&input.to_value())
    }

    pub fn rates(&self) -> &BillingRates {
        &self.rates
    }

    pub fn matcher(&self) -> &Matcher<Decimal> {
        &self.matcher
    }
}

static DEFAULT_ENGINE: OnceLock<Result<BillingEngine, ConfigError>> = OnceLock::new();

/// Cost of `input` under the default rates. Absent usage costs 0.
pub fn evaluate_cost(input: &BillingInput) -> Result<Decimal, MatchError> {
    let engine = DEFAULT_ENGINE
        .get_or_init(BillingEngine::new)
        .as_ref()
        .map_err(|e| MatchError::Config(e.clone()))?;
    engine.evaluate_cost(input)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
