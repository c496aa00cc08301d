use serde::Serialize;
use std::fmt;

/// Terminal result of one checkout attempt.
///
/// Outcomes are logged and counted; the HTTP caller that submitted the item
/// never sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Success,
    OutOfStock,
    PaymentFailed,
    UpstreamFailure,
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Success)
    }

    /// Human readable message, matching what the checkout service has always logged.
    pub fn message(&self) -> &'static str {
        match self {
            CheckoutOutcome::Success => "Yup! you successfully bought the product",
            CheckoutOutcome::OutOfStock => "The product is out of stock at this moment",
            CheckoutOutcome::PaymentFailed => "Your payment is not successfull",
            CheckoutOutcome::UpstreamFailure => "Fail to checkout at this moment",
        }
    }
}

impl fmt::Display for CheckoutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutOutcome::Success => "success",
            CheckoutOutcome::OutOfStock => "out_of_stock",
            CheckoutOutcome::PaymentFailed => "payment_failed",
            CheckoutOutcome::UpstreamFailure => "upstream_failure",
        };
        f.write_str(name)
    }
}
