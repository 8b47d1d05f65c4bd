//! Transaction classification.
//!
//! Precedence, first match wins:
//! 1. domestic and above the high-value threshold
//! 2. domestic
//! 3. the user is a minor
//! 4. everything else from a known transaction is international
//! 5. absent transaction
//! 6. a record of a shape the classifier does not model
//!
//! A domestic minor is classified as domestic; the minor block only applies
//! to foreign transactions.

use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shapecase_core::{
    ClosedVariant, ConfigError, FieldKind, Pattern, RecordDecl, Schema, Shaped, Value,
    VariantDomain,
};
use shapecase_eval::{MatchError, Matcher, MatcherBuilder, Traced};

use crate::config::Policy;

// ──────────────────────────────────────────────
// Data model
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub age: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metadata {
    pub user: User,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub metadata: Metadata,
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(
        name: impl Into<String>,
        age: i64,
        city: impl Into<String>,
        country: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Transaction {
            metadata: Metadata {
                user: User {
                    name: name.into(),
                    age,
                },
                location: Location {
                    city: city.into(),
                    country: country.into(),
                },
            },
            amount,
        }
    }
}

/// The transaction domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionInput {
    Transaction(Transaction),
    /// Something submitted as a transaction that is not one; `kind` names
    /// what it was.
    Unrecognized { kind: String },
    Absent,
}

impl From<Transaction> for TransactionInput {
    fn from(tx: Transaction) -> Self {
        TransactionInput::Transaction(tx)
    }
}

impl From<Option<Transaction>> for TransactionInput {
    fn from(tx: Option<Transaction>) -> Self {
        tx.map_or(TransactionInput::Absent, TransactionInput::Transaction)
    }
}

impl Shaped for Transaction {
    fn to_value(&self) -> Value {
        let Metadata { user, location } = &self.metadata;
        Value::record(
            "Transaction",
            [
                (
                    "metadata",
                    Value::record(
                        "Metadata",
                        [
                            (
                                "user",
                                Value::record(
                                    "User",
                                    [
                                        ("name", Value::from(user.name.as_str())),
                                        ("age", Value::Int(user.age)),
                                    ],
                                ),
                            ),
                            (
                                "location",
                                Value::record(
                                    "Location",
                                    [
                                        ("city", Value::from(location.city.as_str())),
                                        ("country", Value::from(location.country.as_str())),
                                    ],
                                ),
                            ),
                        ],
                    ),
                ),
                ("amount", Value::Decimal(self.amount)),
            ],
        )
    }
}

impl Shaped for TransactionInput {
    fn to_value(&self) -> Value {
        match self {
            TransactionInput::Transaction(tx) => tx.to_value(),
            TransactionInput::Unrecognized { kind } => {
                Value::record("Unrecognized", [("kind", Value::from(kind.as_str()))])
            }
            TransactionInput::Absent => Value::Absent,
        }
    }
}

impl ClosedVariant for TransactionInput {
    const DOMAIN: &'static str = "Transactions";

    fn declare(schema: &mut Schema) -> Result<(), ConfigError> {
        schema.declare_record(
            RecordDecl::new("User")
                .field("name", FieldKind::Text)
                .field("age", FieldKind::Int),
        )?;
        schema.declare_record(
            RecordDecl::new("Location")
                .field("city", FieldKind::Text)
                .field("country", FieldKind::Text),
        )?;
        schema.declare_record(
            RecordDecl::new("Metadata")
                .field("user", FieldKind::Record("User".into()))
                .field("location", FieldKind::Record("Location".into())),
        )?;
        schema.declare_record(
            RecordDecl::new("Transaction")
                .field("metadata", FieldKind::Record("Metadata".into()))
                .field("amount", FieldKind::Decimal),
        )?;
        schema.declare_record(RecordDecl::new("Unrecognized").field("kind", FieldKind::Text))?;
        schema.declare_domain(
            VariantDomain::new(Self::DOMAIN)
                .member("Transaction")
                .member("Unrecognized")
                .with_absent(),
        )
    }
}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    /// Country code treated as domestic. Also used in domestic labels.
    pub home_country: String,
    /// Domestic amounts strictly above this are high-value.
    pub high_value_threshold: Decimal,
    /// Users younger than this are minors.
    pub minor_age: i64,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        ClassifierPolicy {
            home_country: "US".to_string(),
            high_value_threshold: Decimal::from(1000),
            minor_age: 18,
        }
    }
}

impl Policy for ClassifierPolicy {}

// ──────────────────────────────────────────────
// Classifier
// ──────────────────────────────────────────────

/// `Transaction { metadata: { user: { name }, location: { city, country } }, amount }`
fn destructured() -> Pattern {
    Pattern::record("Transaction")
        .field(
            "metadata",
            Pattern::record("Metadata")
                .field("user", Pattern::record("User").bind("name", "name"))
                .field(
                    "location",
                    Pattern::record("Location")
                        .bind("city", "city")
                        .bind("country", "country"),
                ),
        )
        .bind("amount", "amount")
        .into()
}

#[derive(Debug)]
pub struct TransactionClassifier {
    policy: ClassifierPolicy,
    matcher: Matcher<String>,
}

impl TransactionClassifier {
    pub fn new() -> Result<Self, ConfigError> {
        TransactionClassifier::with_policy(ClassifierPolicy::default())
    }

    pub fn with_policy(policy: ClassifierPolicy) -> Result<Self, ConfigError> {
        let home = policy.home_country.clone();
        let threshold = policy.high_value_threshold;
        let minor_age = policy.minor_age;
        let (home_hv, label_hv) = (home.clone(), home.clone());
        let (home_std, label_std) = (home.clone(), home);

        let matcher = MatcherBuilder::for_variant::<TransactionInput>()?
            .rule("high_value_domestic", destructured())
            .when(move |b| Ok(b.text("country")? == home_hv))
            .when(move |b| Ok(b.decimal("amount")? > threshold))
            .then(move |b, _| {
                Ok(format!(
                    "High-value {} transaction from {} by {}",
                    label_hv,
                    b.text("city")?,
                    b.text("name")?
                ))
            })
            .rule("standard_domestic", destructured())
            .when(move |b| Ok(b.text("country")? == home_std))
            .then(move |b, _| {
                Ok(format!(
                    "Standard {} transaction from {} by {}",
                    label_std,
                    b.text("city")?,
                    b.text("name")?
                ))
            })
            .rule(
                "minor_blocked",
                Pattern::record("Transaction").field(
                    "metadata",
                    Pattern::record("Metadata")
                        .bind("user", "user")
                        .bind("location", "location"),
                ),
            )
            .when(move |b| Ok(b.int("user.age")? < minor_age))
            .then(|b, _| {
                Ok(format!(
                    "Blocked: Minor {} attempted transaction from {}",
                    b.text("user.name")?,
                    b.text("location.country")?
                ))
            })
            .rule("international", destructured())
            .then(|b, _| {
                Ok(format!(
                    "International transaction from {} by {}",
                    b.text("country")?,
                    b.text("name")?
                ))
            })
            .rule("absent", Pattern::absent())
            .yields("Invalid transaction: null".to_string())
            .rule("unrecognized", Pattern::record("Unrecognized"))
            .yields("Unknown transaction type".to_string())
            .build()?;

        Ok(TransactionClassifier { policy, matcher })
    }

    pub fn classify(&self, tx: &TransactionInput) -> Result<String, MatchError> {
        self.matcher.evaluate_shaped(tx)
    }

    pub fn classify_traced(&self, tx: &TransactionInput) -> Result<Traced<String>, MatchError> {
        self.matcher.evaluate_traced(&tx.to_value())
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    pub fn matcher(&self) -> &Matcher<String> {
        &self.matcher
    }
}

static DEFAULT_CLASSIFIER: OnceLock<Result<TransactionClassifier, ConfigError>> = OnceLock::new();

/// Classify under the default policy (home `US`, threshold 1000, minors
/// under 18).
pub fn classify_transaction(tx: &TransactionInput) -> Result<String, MatchError> {
    let classifier = DEFAULT_CLASSIFIER
        .get_or_init(TransactionClassifier::new)
        .as_ref()
        .map_err(|e| MatchError::Config(e.clone()))?;
    classifier.classify(tx)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
