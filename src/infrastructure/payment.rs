use crate::domain::ports::PaymentGateway;
use crate::domain::work::Amount;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Stand-in for the payment provider.
///
/// Waits `latency` to mimic a remote round trip, then approves or declines
/// every charge depending on how it was built.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentGateway {
    latency: Duration,
    approve: bool,
}

impl SimulatedPaymentGateway {
    pub fn approving(latency: Duration) -> Self {
        Self {
            latency,
            approve: true,
        }
    }

    pub fn declining(latency: Duration) -> Self {
        Self {
            latency,
            approve: false,
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, product_id: &str, amount: Amount) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.approve {
            tracing::debug!(product_id, %amount, "payment approved");
            Ok(())
        } else {
            Err(CheckoutError::Payment(format!(
                "charge of {} for {} declined",
                amount, product_id
            )))
        }
    }
}
