use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A positive monetary amount requested for a checkout.
///
/// Wraps `rust_decimal::Decimal` so a zero or negative amount can never reach
/// the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// One queued checkout request.
///
/// Built by the admission layer from the inbound body and consumed exactly once
/// by a single worker. The wire name of `requested_amount` is `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub cart_id: String,
    #[serde(rename = "amount")]
    pub requested_amount: Amount,
}

impl WorkItem {
    pub fn new(cart_id: impl Into<String>, requested_amount: Amount) -> Self {
        Self {
            cart_id: cart_id.into(),
            requested_amount,
        }
    }

    /// Rejects items serde accepts but checkout cannot use.
    pub fn validate(self) -> Result<Self, CheckoutError> {
        if self.cart_id.trim().is_empty() {
            return Err(CheckoutError::Validation("cart_id is required".to_string()));
        }
        Ok(self)
    }
}
