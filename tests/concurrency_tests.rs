use common::{ScriptedCarts, ScriptedPayments, executor, item, start_pool};
use oms_checkout::application::lock::LockStrategy;
use oms_checkout::domain::outcome::CheckoutOutcome;
use oms_checkout::domain::product::Product;
use oms_checkout::infrastructure::in_memory::InMemoryInventory;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

mod common;

/// Samples every product until stopped and counts invariant violations.
///
/// Only committed counters are visible here; holds buffered inside an open
/// ledger transaction are checked when that transaction commits.
fn watch_invariant(
    inventory: InMemoryInventory,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<usize> {
    let violations = Arc::new(AtomicUsize::new(0));
    tokio::spawn(async move {
        while !stop.load(Ordering::SeqCst) {
            for product in inventory.snapshot().await {
                if product.sellable() < 0 || product.reserved_qty < 0 || product.available_qty < 0 {
                    violations.fetch_add(1, Ordering::SeqCst);
                }
            }
            tokio::task::yield_now().await;
        }
        violations.load(Ordering::SeqCst)
    })
}

async fn race(
    strategy: LockStrategy,
    available: i64,
    quantity: u32,
    requests: usize,
) -> (Vec<CheckoutOutcome>, Product, usize) {
    let inventory = InMemoryInventory::with_products([Product::new("p-1", available)]);
    let carts = ScriptedCarts::new(&[("c-1", "p-1", quantity)]);
    let payments = ScriptedPayments::approving().with_latency(Duration::from_millis(1));
    let pool = start_pool(executor(&inventory, carts, payments, strategy), 8, requests);

    let stop = Arc::new(AtomicBool::new(false));
    let watcher = watch_invariant(inventory.clone(), Arc::clone(&stop));

    let producers: Vec<_> = (0..requests)
        .map(|_| {
            let queue = pool.queue().clone();
            tokio::spawn(async move { queue.submit(item("c-1")).await.unwrap().outcome().await })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(requests);
    for producer in producers {
        outcomes.push(producer.await.unwrap().unwrap());
    }

    stop.store(true, Ordering::SeqCst);
    let violations = watcher.await.unwrap();
    pool.shutdown().await.unwrap();

    let product = inventory.get("p-1").await.unwrap();
    (outcomes, product, violations)
}

fn count(outcomes: &[CheckoutOutcome], wanted: CheckoutOutcome) -> usize {
    outcomes.iter().filter(|o| **o == wanted).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_never_oversell() {
    let (outcomes, product, violations) = race(LockStrategy::Global, 7, 2, 20).await;

    // floor(7 / 2) = 3 winners, everyone else is told the stock is gone.
    assert_eq!(count(&outcomes, CheckoutOutcome::Success), 3);
    assert_eq!(count(&outcomes, CheckoutOutcome::OutOfStock), 17);
    assert_eq!(product.available_qty, 1);
    assert_eq!(product.reserved_qty, 0);
    assert_eq!(violations, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_product_lock_never_oversells() {
    let (outcomes, product, violations) = race(LockStrategy::PerProduct, 10, 3, 12).await;

    assert_eq!(count(&outcomes, CheckoutOutcome::Success), 3);
    assert_eq!(count(&outcomes, CheckoutOutcome::OutOfStock), 9);
    assert_eq!(product.available_qty, 1);
    assert_eq!(product.reserved_qty, 0);
    assert_eq!(violations, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sold_units_match_successful_checkouts() {
    let inventory = InMemoryInventory::with_products([
        Product::new("p-1", 9),
        Product::new("p-2", 4),
        Product::new("p-3", 0),
    ]);
    let carts = ScriptedCarts::new(&[
        ("one", "p-1", 1),
        ("two", "p-1", 2),
        ("four", "p-2", 4),
        ("none", "p-3", 1),
    ]);
    let payments = ScriptedPayments::approving().with_latency(Duration::from_millis(1));
    let pool = start_pool(
        executor(&inventory, carts, payments, LockStrategy::PerProduct),
        6,
        64,
    );

    let mut plan: Vec<&str> = std::iter::repeat_n("one", 8)
        .chain(std::iter::repeat_n("two", 8))
        .chain(std::iter::repeat_n("four", 3))
        .chain(std::iter::repeat_n("none", 3))
        .collect();
    plan.shuffle(&mut rand::thread_rng());

    let mut receipts = Vec::new();
    for cart in &plan {
        receipts.push((*cart, pool.queue().submit(item(cart)).await.unwrap()));
    }

    let mut sold: std::collections::HashMap<&str, i64> = Default::default();
    for (cart, receipt) in receipts {
        if receipt.outcome().await.unwrap().is_success() {
            let (product, quantity) = match cart {
                "one" => ("p-1", 1),
                "two" => ("p-1", 2),
                "four" => ("p-2", 4),
                _ => ("p-3", 1),
            };
            *sold.entry(product).or_default() += quantity;
        }
    }
    pool.shutdown().await.unwrap();

    for (id, initial) in [("p-1", 9), ("p-2", 4), ("p-3", 0)] {
        let product = inventory.get(id).await.unwrap();
        let sold = sold.get(id).copied().unwrap_or(0);
        assert_eq!(product.available_qty, initial - sold, "{id}");
        assert_eq!(product.reserved_qty, 0, "{id}");
        assert!(product.sellable() >= 0, "{id}");
    }
    assert_eq!(sold.get("p-2").copied().unwrap_or(0), 4);
    assert_eq!(sold.get("p-3"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_declined_payments_under_contention_restore_stock() {
    let inventory = InMemoryInventory::with_products([Product::new("p-1", 5)]);
    let carts = ScriptedCarts::new(&[("c-1", "p-1", 2)]);
    let pool = start_pool(
        executor(&inventory, carts, ScriptedPayments::declining(), LockStrategy::Global),
        4,
        16,
    );

    let mut receipts = Vec::new();
    for _ in 0..10 {
        receipts.push(pool.queue().submit(item("c-1")).await.unwrap());
    }
    for receipt in receipts {
        assert_eq!(
            receipt.outcome().await.unwrap(),
            CheckoutOutcome::PaymentFailed
        );
    }
    pool.shutdown().await.unwrap();

    assert_eq!(inventory.get("p-1").await.unwrap(), Product::new("p-1", 5));
}
