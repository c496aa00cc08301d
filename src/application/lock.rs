use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// How checkouts contend for the inventory-critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LockStrategy {
    /// One lock for the whole catalog: every checkout serializes.
    #[default]
    Global,
    /// One lock per product id, created on first use.
    PerProduct,
}

/// Held for the stock-check-through-commit window of one checkout.
pub type InventoryGuard = OwnedMutexGuard<()>;

/// The process-wide lock guarding product counters.
pub enum InventoryLock {
    Global(Arc<Mutex<()>>),
    PerProduct(Mutex<HashMap<String, Arc<Mutex<()>>>>),
}

impl InventoryLock {
    pub fn new(strategy: LockStrategy) -> Self {
        match strategy {
            LockStrategy::Global => InventoryLock::Global(Arc::new(Mutex::new(()))),
            LockStrategy::PerProduct => InventoryLock::PerProduct(Mutex::new(HashMap::new())),
        }
    }

    pub fn strategy(&self) -> LockStrategy {
        match self {
            InventoryLock::Global(_) => LockStrategy::Global,
            InventoryLock::PerProduct(_) => LockStrategy::PerProduct,
        }
    }

    /// Waits for exclusive access to `product_id`'s counters.
    ///
    /// Under [`LockStrategy::Global`] the id is ignored and all products share
    /// one guard.
    pub async fn acquire(&self, product_id: &str) -> InventoryGuard {
        let lock = match self {
            InventoryLock::Global(lock) => Arc::clone(lock),
            InventoryLock::PerProduct(locks) => {
                let mut locks = locks.lock().await;
                Arc::clone(locks.entry(product_id.to_string()).or_default())
            }
        };
        lock.lock_owned().await
    }
}

impl Default for InventoryLock {
    fn default() -> Self {
        Self::new(LockStrategy::default())
    }
}
