//! Rule tables built on the shapecase evaluator.
//!
//! Each module declares a closed domain, its typed inputs, and an engine
//! holding a checked [`shapecase_eval::Matcher`]. The free functions use a
//! default engine built once per process.
//!
//! - [`evaluate_cost`] -- usage cost by region and tier
//! - [`classify_transaction`] -- transaction labels by country, amount and age
//! - [`total_size`] -- recursive file tree size
//! - [`describe_payment`] -- payment method descriptions

pub mod billing;
pub mod config;
pub mod filesystem;
pub mod payment;
pub mod transaction;

pub use billing::{evaluate_cost, BillingEngine, BillingInput, BillingRates, Identity, Resource, Usage};
pub use config::{Policy, PolicyError};
pub use filesystem::{total_size, FileNode, SizeAggregator};
pub use payment::{describe_payment, PaymentMethod, PaymentRoute, PaymentRouter};
pub use transaction::{
    classify_transaction, ClassifierPolicy, Location, Metadata, Transaction, TransactionClassifier,
    TransactionInput, User,
};
