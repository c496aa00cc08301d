use super::product::{CartSnapshot, Product};
use super::work::Amount;
use crate::error::Result;
use async_trait::async_trait;

/// Resolves a cart reference into the product line being bought.
#[async_trait]
pub trait CartService: Send + Sync {
    async fn find_cart(&self, cart_id: &str) -> Result<CartSnapshot>;
}

/// Reads the latest committed stock counters of a product.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product(&self, product_id: &str) -> Result<Product>;
}

/// Charges the customer. `Ok(())` means the payment went through.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, product_id: &str, amount: Amount) -> Result<()>;
}

/// Opens transactions over the product counters.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn begin(&self) -> Result<LedgerTxBox>;
}

/// One open ledger transaction.
///
/// Nothing written through it is visible to readers until [`LedgerTx::commit`].
/// Dropping it without committing discards the writes.
#[async_trait]
pub trait LedgerTx: Send {
    /// Raises `reserved_qty` by `quantity` only if the sellable quantity covers it.
    /// Returns `false`, writing nothing, when it does not.
    async fn reserve(&mut self, product_id: &str, quantity: u32) -> Result<bool>;

    /// Lowers `reserved_qty` by `quantity`, undoing a hold.
    async fn release(&mut self, product_id: &str, quantity: u32) -> Result<()>;

    /// Turns a hold into a sale: lowers both `available_qty` and `reserved_qty`.
    async fn finalize(&mut self, product_id: &str, quantity: u32) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub type CartServiceBox = Box<dyn CartService>;
pub type ProductCatalogBox = Box<dyn ProductCatalog>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type ReservationLedgerBox = Box<dyn ReservationLedger>;
pub type LedgerTxBox = Box<dyn LedgerTx>;
