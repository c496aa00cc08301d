use crate::domain::ports::{LedgerTx, LedgerTxBox, ProductCatalog, ReservationLedger};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory product inventory.
///
/// Serves both as the reservation ledger and as the product catalog, so reads
/// through [`ProductCatalog`] always reflect the latest committed counters.
/// Clones share the same underlying map.
#[derive(Default, Clone)]
pub struct InMemoryInventory {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryInventory {
    /// Creates a new, empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory pre-loaded with the given products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect::<HashMap<_, _>>();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    /// Inserts or replaces a product.
    pub async fn upsert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.clone(), product);
    }

    /// Returns the committed state of a product, if known.
    pub async fn get(&self, product_id: &str) -> Option<Product> {
        let products = self.products.read().await;
        products.get(product_id).cloned()
    }

    /// Returns the committed state of every product.
    pub async fn snapshot(&self) -> Vec<Product> {
        let products = self.products.read().await;
        products.values().cloned().collect()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryInventory {
    async fn find_product(&self, product_id: &str) -> Result<Product> {
        self.get(product_id)
            .await
            .ok_or_else(|| CheckoutError::Upstream(format!("Product {} not found", product_id)))
    }
}

#[async_trait]
impl ReservationLedger for InMemoryInventory {
    async fn begin(&self) -> Result<LedgerTxBox> {
        Ok(Box::new(InMemoryLedgerTx {
            products: Arc::clone(&self.products),
            pending: HashMap::new(),
        }))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CounterDelta {
    available: i64,
    reserved: i64,
}

/// Buffers counter deltas and applies them atomically on commit.
struct InMemoryLedgerTx {
    products: Arc<RwLock<HashMap<String, Product>>>,
    pending: HashMap<String, CounterDelta>,
}

impl InMemoryLedgerTx {
    fn delta(&mut self, product_id: &str) -> &mut CounterDelta {
        self.pending.entry(product_id.to_string()).or_default()
    }
}

fn apply(product: &Product, delta: CounterDelta) -> Product {
    Product {
        id: product.id.clone(),
        available_qty: product.available_qty + delta.available,
        reserved_qty: product.reserved_qty + delta.reserved,
    }
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn reserve(&mut self, product_id: &str, quantity: u32) -> Result<bool> {
        let current = {
            let products = self.products.read().await;
            match products.get(product_id) {
                Some(product) => product.clone(),
                None => {
                    return Err(CheckoutError::Persistence(format!(
                        "Product {} not found in ledger",
                        product_id
                    )));
                }
            }
        };
        let delta = self.pending.get(product_id).copied().unwrap_or_default();
        if !apply(&current, delta).can_reserve(quantity) {
            return Ok(false);
        }
        self.delta(product_id).reserved += i64::from(quantity);
        Ok(true)
    }

    async fn release(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        self.delta(product_id).reserved -= i64::from(quantity);
        Ok(())
    }

    async fn finalize(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let delta = self.delta(product_id);
        delta.available -= i64::from(quantity);
        delta.reserved -= i64::from(quantity);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut products = self.products.write().await;

        // Validate everything first so a failed commit writes nothing.
        let mut updated = Vec::with_capacity(self.pending.len());
        for (id, delta) in &self.pending {
            let product = products
                .get(id)
                .ok_or_else(|| CheckoutError::Persistence(format!("Product {} not found", id)))?;
            let next = apply(product, *delta);
            if next.reserved_qty < 0 || next.sellable() < 0 {
                return Err(CheckoutError::Persistence(format!(
                    "Commit would leave product {} at available={} reserved={}",
                    id, next.available_qty, next.reserved_qty
                )));
            }
            updated.push(next);
        }

        for product in updated {
            products.insert(product.id.clone(), product);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
