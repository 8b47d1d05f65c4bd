//! End-to-end scenarios for the built-in rule tables.

use std::io::Write;

use rust_decimal::Decimal;
use shapecase_core::Member;
use shapecase_domains::{
    classify_transaction, describe_payment, evaluate_cost, total_size, BillingEngine, BillingInput,
    BillingRates, ClassifierPolicy, FileNode, Identity, PaymentMethod, Policy, PolicyError,
    Resource, SizeAggregator, Transaction, TransactionClassifier, TransactionInput, Usage,
};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn usage(region: &str, tier: &str, quantity: i64) -> BillingInput {
    Usage::new(
        Resource::new("Compute", Identity::new(region, tier)),
        Decimal::from(quantity),
    )
    .into()
}

fn transaction(name: &str, age: i64, city: &str, country: &str, amount: i64) -> TransactionInput {
    Transaction::new(name, age, city, country, Decimal::from(amount)).into()
}

// ──────────────────────────────────────────────
// Billing
// ──────────────────────────────────────────────

#[test]
fn billing_scenarios() {
    let cases = [
        (usage("EU", "PREMIUM", 100), Decimal::new(250, 1)),
        (usage("US", "PREMIUM", 100), Decimal::new(200, 1)),
        (usage("EU", "STANDARD", 100), Decimal::new(150, 1)),
        (usage("US", "STANDARD", 100), Decimal::new(100, 1)),
        (BillingInput::Absent, Decimal::new(0, 1)),
    ];
    for (input, expected) in cases {
        assert_eq!(evaluate_cost(&input).unwrap(), expected, "input: {:?}", input);
    }
}

#[test]
fn billing_covers_every_member() {
    let engine = BillingEngine::new().unwrap();
    let coverage = engine.matcher().coverage();
    assert_eq!(coverage.rule_for(&Member::Shape("Usage".into())), Some("base"));
    assert_eq!(coverage.rule_for(&Member::Absent), Some("absent"));
}

#[test]
fn billing_input_from_json() {
    let input: BillingInput = serde_json::from_value(serde_json::json!({
        "Usage": {
            "resource": { "type": "Storage", "identity": { "region": "EU", "tier": "PREMIUM" } },
            "quantity": "4"
        }
    }))
    .unwrap();
    assert_eq!(evaluate_cost(&input).unwrap(), Decimal::from(1));
}

// ──────────────────────────────────────────────
// Transactions
// ──────────────────────────────────────────────

#[test]
fn transaction_scenarios() {
    let cases = [
        (
            transaction("Alice", 30, "New York", "US", 1500),
            "High-value US transaction from New York by Alice",
        ),
        (
            transaction("Alice", 30, "New York", "US", 1000),
            "Standard US transaction from New York by Alice",
        ),
        (
            transaction("Sam", 17, "Madrid", "ES", 30),
            "Blocked: Minor Sam attempted transaction from ES",
        ),
        (
            transaction("Ola", 45, "Oslo", "NO", 30),
            "International transaction from NO by Ola",
        ),
        (TransactionInput::Absent, "Invalid transaction: null"),
        (
            TransactionInput::Unrecognized {
                kind: "Chargeback".into(),
            },
            "Unknown transaction type",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(classify_transaction(&input).unwrap(), expected);
    }
}

#[test]
fn transaction_table_covers_absent_and_unrecognized() {
    let classifier = TransactionClassifier::new().unwrap();
    let coverage = classifier.matcher().coverage();
    assert_eq!(coverage.rule_for(&Member::Shape("Transaction".into())), Some("international"));
    assert_eq!(coverage.rule_for(&Member::Shape("Unrecognized".into())), Some("unrecognized"));
    assert_eq!(coverage.rule_for(&Member::Absent), Some("absent"));
}

#[test]
fn repeated_classification_is_stable() {
    let input = transaction("Alice", 30, "New York", "US", 1500);
    let first = classify_transaction(&input).unwrap();
    for _ in 0..10 {
        assert_eq!(classify_transaction(&input).unwrap(), first);
    }
}

// ──────────────────────────────────────────────
// File tree and payments
// ──────────────────────────────────────────────

#[test]
fn sample_tree_totals_300() {
    let tree = FileNode::directory(
        "root",
        vec![
            FileNode::file("f1", 100),
            FileNode::directory("sub", vec![FileNode::file("f2", 200)]),
        ],
    );
    assert_eq!(total_size(&tree).unwrap(), 300);
    assert_eq!(SizeAggregator::new().unwrap().total_size(&tree).unwrap(), 300);
}

#[test]
fn payment_descriptions() {
    let card = PaymentMethod::CreditCard {
        card_number: "5500000000000004".into(),
        expiry: "01/30".into(),
    };
    assert_eq!(
        describe_payment(&card, Decimal::from(20)).unwrap(),
        "Charging 20 to Credit Card ending in 0004"
    );
}

// ──────────────────────────────────────────────
// Configuration files
// ──────────────────────────────────────────────

#[test]
fn rates_load_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rates.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "eu_region = \"EEA\"").unwrap();
    writeln!(file, "eu = \"0.50\"").unwrap();
    drop(file);

    let rates = BillingRates::from_path(&path).unwrap();
    let engine = BillingEngine::with_rates(rates).unwrap();
    assert_eq!(
        engine.evaluate_cost(&usage("EEA", "STANDARD", 10)).unwrap(),
        Decimal::from(5)
    );
    assert_eq!(
        engine.evaluate_cost(&usage("EU", "STANDARD", 10)).unwrap(),
        Decimal::from(1)
    );
}

#[test]
fn policy_loads_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.json");
    std::fs::write(&path, r#"{ "home_country": "GB", "minor_age": 16 }"#).unwrap();

    let policy = ClassifierPolicy::from_path(&path).unwrap();
    let classifier = TransactionClassifier::with_policy(policy).unwrap();
    assert_eq!(
        classifier
            .classify(&transaction("Ada", 36, "London", "GB", 5000))
            .unwrap(),
        "High-value GB transaction from London by Ada"
    );
    assert_eq!(
        classifier
            .classify(&transaction("Ben", 17, "Boston", "US", 5))
            .unwrap(),
        "International transaction from US by Ben"
    );
}

#[test]
fn policy_file_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        ClassifierPolicy::from_path(&missing),
        Err(PolicyError::Io { .. })
    ));

    let yaml = dir.path().join("policy.yaml");
    std::fs::write(&yaml, "minor_age: 16").unwrap();
    assert!(matches!(
        ClassifierPolicy::from_path(&yaml),
        Err(PolicyError::UnsupportedFormat { .. })
    ));

    let broken = dir.path().join("policy.json");
    std::fs::write(&broken, "{ minor_age: ").unwrap();
    assert!(matches!(
        ClassifierPolicy::from_path(&broken),
        Err(PolicyError::Json(_))
    ));
}
