use crate::domain::outcome::CheckoutOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    succeeded: AtomicU64,
    out_of_stock: AtomicU64,
    payment_failed: AtomicU64,
    upstream_failure: AtomicU64,
    persistence_failure: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub succeeded: u64,
    pub out_of_stock: u64,
    pub payment_failed: u64,
    pub upstream_failure: u64,
    pub persistence_failure: u64,
}

impl StatsSnapshot {
    pub fn processed(&self) -> u64 {
        self.succeeded
            + self.out_of_stock
            + self.payment_failed
            + self.upstream_failure
            + self.persistence_failure
    }
}

impl PoolStats {
    pub fn record(&self, outcome: CheckoutOutcome) {
        let counter = match outcome {
            CheckoutOutcome::Success => &self.succeeded,
            CheckoutOutcome::OutOfStock => &self.out_of_stock,
            CheckoutOutcome::PaymentFailed => &self.payment_failed,
            CheckoutOutcome::UpstreamFailure => &self.upstream_failure,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            out_of_stock: self.out_of_stock.load(Ordering::Relaxed),
            payment_failed: self.payment_failed.load(Ordering::Relaxed),
            upstream_failure: self.upstream_failure.load(Ordering::Relaxed),
            persistence_failure: self.persistence_failure.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let stats = PoolStats::default();
        stats.record(CheckoutOutcome::Success);
        stats.record(CheckoutOutcome::Success);
        stats.record(CheckoutOutcome::OutOfStock);
        stats.record_persistence_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.succeeded, 2);
        assert_eq!(snapshot.out_of_stock, 1);
        assert_eq!(snapshot.persistence_failure, 1);
        assert_eq!(snapshot.processed(), 4);
    }
}
