use super::lock::InventoryLock;
use crate::domain::outcome::CheckoutOutcome;
use crate::domain::ports::{
    CartServiceBox, LedgerTx, PaymentGatewayBox, ProductCatalogBox, ReservationLedgerBox,
};
use crate::domain::product::CartSnapshot;
use crate::domain::work::WorkItem;
use crate::error::Result;
use tracing::{debug, warn};

/// Runs the reserve → pay → commit/rollback protocol for one work item.
///
/// A single executor is shared by every worker. All counter mutations happen
/// inside one ledger transaction, and the stock check, the reservation, the
/// payment and the commit all happen under the inventory lock, so two
/// checkouts can never both pass the stock check against the same units.
pub struct CheckoutExecutor {
    ledger: ReservationLedgerBox,
    carts: CartServiceBox,
    catalog: ProductCatalogBox,
    payments: PaymentGatewayBox,
    lock: InventoryLock,
}

impl CheckoutExecutor {
    /// Creates a new `CheckoutExecutor`.
    ///
    /// # Arguments
    ///
    /// * `ledger` - Transactional access to the product counters.
    /// * `carts` - Resolves a cart id into its product line.
    /// * `catalog` - Reads the latest committed counters of a product.
    /// * `payments` - Charges the customer.
    /// * `lock` - Guards the stock-check-and-reserve critical section.
    pub fn new(
        ledger: ReservationLedgerBox,
        carts: CartServiceBox,
        catalog: ProductCatalogBox,
        payments: PaymentGatewayBox,
        lock: InventoryLock,
    ) -> Self {
        Self {
            ledger,
            carts,
            catalog,
            payments,
            lock,
        }
    }

    pub fn lock(&self) -> &InventoryLock {
        &self.lock
    }

    /// Executes the checkout for `item`.
    ///
    /// Business results come back as `Ok(outcome)`. `Err` is reserved for
    /// ledger failures (begin, update, commit, or a product the ledger does
    /// not hold), in which case nothing was committed.
    pub async fn execute(&self, item: &WorkItem) -> Result<CheckoutOutcome> {
        let mut tx = self.ledger.begin().await?;

        let cart = match self.carts.find_cart(&item.cart_id).await {
            Ok(cart) => cart,
            Err(e) => {
                warn!(cart_id = %item.cart_id, error = %e, "cart lookup failed");
                tx.rollback().await?;
                return Ok(CheckoutOutcome::UpstreamFailure);
            }
        };
        debug!(cart_id = %item.cart_id, product_id = %cart.product_id, quantity = cart.quantity, "cart resolved");

        let _guard = self.lock.acquire(&cart.product_id).await;

        match self.reserve_and_pay(&mut *tx, item, &cart).await {
            Ok(CheckoutOutcome::Success) => {
                tx.commit().await?;
                Ok(CheckoutOutcome::Success)
            }
            Ok(outcome) => {
                tx.rollback().await?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback after ledger failure failed");
                }
                Err(e)
            }
        }
    }

    // Must run with the inventory guard held.
    async fn reserve_and_pay(
        &self,
        tx: &mut dyn LedgerTx,
        item: &WorkItem,
        cart: &CartSnapshot,
    ) -> Result<CheckoutOutcome> {
        let product = match self.catalog.find_product(&cart.product_id).await {
            Ok(product) => product,
            Err(e) => {
                warn!(product_id = %cart.product_id, error = %e, "product lookup failed");
                return Ok(CheckoutOutcome::UpstreamFailure);
            }
        };

        if !product.can_reserve(cart.quantity) {
            debug!(
                product_id = %product.id,
                sellable = product.sellable(),
                requested = cart.quantity,
                "out of stock"
            );
            return Ok(CheckoutOutcome::OutOfStock);
        }

        // The ledger re-checks the sellable quantity; a stale catalog read
        // cannot push it below zero.
        if !tx.reserve(&cart.product_id, cart.quantity).await? {
            debug!(product_id = %product.id, "reservation refused by ledger");
            return Ok(CheckoutOutcome::OutOfStock);
        }

        if let Err(e) = self
            .payments
            .charge(&cart.product_id, item.requested_amount)
            .await
        {
            warn!(product_id = %cart.product_id, error = %e, "payment failed");
            tx.release(&cart.product_id, cart.quantity).await?;
            return Ok(CheckoutOutcome::PaymentFailed);
        }

        tx.finalize(&cart.product_id, cart.quantity).await?;
        Ok(CheckoutOutcome::Success)
    }
}
