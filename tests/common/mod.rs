#![allow(dead_code)]

use async_trait::async_trait;
use oms_checkout::application::executor::CheckoutExecutor;
use oms_checkout::application::lock::{InventoryLock, LockStrategy};
use oms_checkout::application::pool::{PoolConfig, WorkerPool};
use oms_checkout::domain::ports::{CartService, PaymentGateway};
use oms_checkout::domain::product::CartSnapshot;
use oms_checkout::domain::work::{Amount, WorkItem};
use oms_checkout::error::{CheckoutError, Result};
use oms_checkout::infrastructure::in_memory::InMemoryInventory;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Cart service backed by a fixed map that records every lookup.
#[derive(Clone, Default)]
pub struct ScriptedCarts {
    lines: Arc<HashMap<String, CartSnapshot>>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCarts {
    pub fn new(lines: &[(&str, &str, u32)]) -> Self {
        let lines = lines
            .iter()
            .map(|(cart, product, quantity)| {
                (
                    cart.to_string(),
                    CartSnapshot {
                        product_id: product.to_string(),
                        quantity: *quantity,
                    },
                )
            })
            .collect();
        Self {
            lines: Arc::new(lines),
            lookups: Arc::default(),
        }
    }

    /// Cart ids in the order they were looked up.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl CartService for ScriptedCarts {
    async fn find_cart(&self, cart_id: &str) -> Result<CartSnapshot> {
        self.lookups.lock().unwrap().push(cart_id.to_string());
        self.lines
            .get(cart_id)
            .cloned()
            .ok_or_else(|| CheckoutError::Upstream(format!("Cart {} not found", cart_id)))
    }
}

/// Payment gateway whose answer, latency and pacing are controlled by the test.
#[derive(Clone)]
pub struct ScriptedPayments {
    approve: Arc<AtomicBool>,
    latency: Duration,
    gate: Option<Arc<Semaphore>>,
    charges: Arc<AtomicUsize>,
}

impl ScriptedPayments {
    pub fn approving() -> Self {
        Self {
            approve: Arc::new(AtomicBool::new(true)),
            latency: Duration::ZERO,
            gate: None,
            charges: Arc::default(),
        }
    }

    pub fn declining() -> Self {
        let payments = Self::approving();
        payments.approve.store(false, Ordering::SeqCst);
        payments
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every charge waits for one permit on the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedPayments {
    async fn charge(&self, product_id: &str, _amount: Amount) -> Result<()> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| CheckoutError::Payment(e.to_string()))?
                .forget();
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.approve.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CheckoutError::Payment(format!("declined for {}", product_id)))
        }
    }
}

pub fn item(cart_id: &str) -> WorkItem {
    WorkItem::new(cart_id, Amount::new(dec!(25.0)).unwrap())
}

pub fn executor(
    inventory: &InMemoryInventory,
    carts: ScriptedCarts,
    payments: ScriptedPayments,
    strategy: LockStrategy,
) -> Arc<CheckoutExecutor> {
    Arc::new(CheckoutExecutor::new(
        Box::new(inventory.clone()),
        Box::new(carts),
        Box::new(inventory.clone()),
        Box::new(payments),
        InventoryLock::new(strategy),
    ))
}

pub fn start_pool(executor: Arc<CheckoutExecutor>, workers: usize, queue_capacity: usize) -> WorkerPool {
    WorkerPool::start(
        executor,
        PoolConfig {
            workers,
            dispatchers: 1,
            queue_capacity,
        },
    )
    .unwrap()
}
