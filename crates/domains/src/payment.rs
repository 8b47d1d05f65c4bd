//! Payment descriptions: one unguarded rule per payment method.

use std::fmt;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shapecase_core::{
    ClosedVariant, ConfigError, FieldKind, Pattern, RecordDecl, Schema, Shaped, Value,
    VariantDomain,
};
use shapecase_eval::{MatchError, Matcher, MatcherBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum PaymentMethod {
    CreditCard { card_number: String, expiry: String },
    PayPal { email: String },
    Crypto { wallet_address: String, coin_type: String },
}

impl Shaped for PaymentMethod {
    fn to_value(&self) -> Value {
        match self {
            PaymentMethod::CreditCard {
                card_number,
                expiry,
            } => Value::record(
                "CreditCard",
                [
                    ("card_number", Value::from(card_number.as_str())),
                    ("expiry", Value::from(expiry.as_str())),
                ],
            ),
            PaymentMethod::PayPal { email } => {
                Value::record("PayPal", [("email", Value::from(email.as_str()))])
            }
            PaymentMethod::Crypto {
                wallet_address,
                coin_type,
            } => Value::record(
                "Crypto",
                [
                    ("wallet_address", Value::from(wallet_address.as_str())),
                    ("coin_type", Value::from(coin_type.as_str())),
                ],
            ),
        }
    }
}

impl ClosedVariant for PaymentMethod {
    const DOMAIN: &'static str = "PaymentMethod";

    fn declare(schema: &mut Schema) -> Result<(), ConfigError> {
        schema.declare_record(
            RecordDecl::new("CreditCard")
                .field("card_number", FieldKind::Text)
                .field("expiry", FieldKind::Text),
        )?;
        schema.declare_record(RecordDecl::new("PayPal").field("email", FieldKind::Text))?;
        schema.declare_record(
            RecordDecl::new("Crypto")
                .field("wallet_address", FieldKind::Text)
                .field("coin_type", FieldKind::Text),
        )?;
        schema.declare_domain(
            VariantDomain::new(Self::DOMAIN)
                .member("CreditCard")
                .member("PayPal")
                .member("Crypto"),
        )
    }
}

/// Where a payment goes, with only what a description needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRoute {
    Card { last_four: String },
    PayPal { email: String },
    Crypto { coin: String, wallet: String },
}

impl PaymentRoute {
    pub fn describe(&self, amount: Decimal) -> String {
        DescribedPayment {
            route: self,
            amount,
        }
        .to_string()
    }
}

struct DescribedPayment<'a> {
    route: &'a PaymentRoute,
    amount: Decimal,
}

impl fmt::Display for DescribedPayment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.route {
            PaymentRoute::Card { last_four } => write!(
                f,
                "Charging {} to Credit Card ending in {}",
                self.amount, last_four
            ),
            PaymentRoute::PayPal { email } => write!(
                f,
                "Processing PayPal payment for {} to {}",
                self.amount, email
            ),
            PaymentRoute::Crypto { coin, wallet } => {
                write!(f, "Transferring {} {} to {}", self.amount, coin, wallet)
            }
        }
    }
}

/// Last four characters, or the whole string if shorter.
fn last_four(card_number: &str) -> String {
    let count = card_number.chars().count();
    card_number.chars().skip(count.saturating_sub(4)).collect()
}

#[derive(Debug)]
pub struct PaymentRouter {
    matcher: Matcher<PaymentRoute>,
}

impl PaymentRouter {
    pub fn new() -> Result<Self, ConfigError> {
        let matcher = MatcherBuilder::for_variant::<PaymentMethod>()?
            .rule("credit_card", Pattern::record("CreditCard").bind("card_number", "number"))
            .then(|b, _| {
                Ok(PaymentRoute::Card {
                    last_four: last_four(b.text("number")?),
                })
            })
            .rule("paypal", Pattern::record("PayPal").bind("email", "email"))
            .then(|b, _| {
                Ok(PaymentRoute::PayPal {
                    email: b.text("email")?.to_string(),
                })
            })
            .rule(
                "crypto",
                Pattern::record("Crypto")
                    .bind("wallet_address", "wallet")
                    .bind("coin_type", "coin"),
            )
            .then(|b, _| {
                Ok(PaymentRoute::Crypto {
                    coin: b.text("coin")?.to_string(),
                    wallet: b.text("wallet")?.to_string(),
                })
            })
            .build()?;
        Ok(PaymentRouter { matcher })
    }

    pub fn route(&self, method: &PaymentMethod) -> Result<PaymentRoute, MatchError> {
        self.matcher.evaluate_shaped(method)
    }
}

static DEFAULT_ROUTER: OnceLock<Result<PaymentRouter, ConfigError>> = OnceLock::new();

/// Human-readable description of charging `amount` to `method`.
pub fn describe_payment(method: &PaymentMethod, amount: Decimal) -> Result<String, MatchError> {
    let router = DEFAULT_ROUTER
        .get_or_init(PaymentRouter::new)
        .as_ref()
        .map_err(|e| MatchError::Config(e.clone()))?;
    Ok(router.route(method)?.describe(amount))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_card() {
        let card = PaymentMethod::CreditCard {
            card_number: "4111111111111234".into(),
            expiry: "12/28".into(),
        };
        assert_eq!(
            describe_payment(&card, Decimal::new(10050, 2)).unwrap(),
            "Charging 100.50 to Credit Card ending in 1234"
        );
    }

    #[test]
    fn short_card_number_is_shown_whole() {
        assert_eq!(last_four("42"), "42");
        assert_eq!(last_four(""), "");
        assert_eq!(last_four("12345"), "2345");
    }

    #[test]
    fn paypal_and_crypto() {
        let paypal = PaymentMethod::PayPal {
            email: "user@example.com".into(),
        };
        assert_eq!(
            describe_payment(&paypal, Decimal::from(50)).unwrap(),
            "Processing PayPal payment for 50 to user@example.com"
        );

        let crypto = PaymentMethod::Crypto {
            wallet_address: "0xabc".into(),
            coin_type: "ETH".into(),
        };
        assert_eq!(
            describe_payment(&crypto, Decimal::new(25, 1)).unwrap(),
            "Transferring 2.5 ETH to 0xabc"
        );
    }

    #[test]
    fn every_method_has_its_own_rule() {
        let router = PaymentRouter::new().unwrap();
        assert_eq!(
            router.matcher.rule_ids(),
            vec!["credit_card", "paypal", "crypto"]
        );
        assert_eq!(router.matcher.coverage().0.len(), 3);
    }
}
