use super::executor::CheckoutExecutor;
use super::queue::Job;
use super::registry::WorkerRegistry;
use super::stats::PoolStats;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

/// A long-lived execution unit of the pool.
///
/// Loops over: advertise as idle, wait for one job, run the checkout, log the
/// outcome. Stops when `shutdown` fires while it is idle; an in-flight job is
/// always finished first.
pub struct Worker {
    id: usize,
    registry: WorkerRegistry,
    executor: Arc<CheckoutExecutor>,
    stats: Arc<PoolStats>,
    shutdown: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        registry: WorkerRegistry,
        executor: Arc<CheckoutExecutor>,
        stats: Arc<PoolStats>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            registry,
            executor,
            stats,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!(worker_id = self.id, "starting worker");
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let Ok(mut assignment) = self.registry.publish(self.id).await else {
                break;
            };
            let job = tokio::select! {
                biased;
                job = &mut assignment => match job {
                    Ok(job) => job,
                    Err(_) => break,
                },
                _ = self.shutdown.cancelled() => break,
            };
            self.process(job).await;
        }
        info!(worker_id = self.id, "worker stopped");
    }

    async fn process(&self, job: Job) {
        let span = info_span!("checkout", worker_id = self.id, cart_id = %job.item.cart_id);
        async {
            info!("working on cart");
            let result = self.executor.execute(&job.item).await;
            match &result {
                Ok(outcome) => {
                    self.stats.record(*outcome);
                    info!(%outcome, "{}", outcome.message());
                }
                Err(e) => {
                    self.stats.record_persistence_failure();
                    error!(error = %e, "checkout aborted, nothing committed");
                }
            }
            job.complete(result);
        }
        .instrument(span)
        .await
    }
}
