use super::dispatcher::Dispatcher;
use super::executor::CheckoutExecutor;
use super::queue::{AdmissionQueue, DEFAULT_QUEUE_CAPACITY};
use super::registry::WorkerRegistry;
use super::stats::{PoolStats, StatsSnapshot};
use super::worker::Worker;
use crate::error::{CheckoutError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Sizing of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub dispatchers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            dispatchers: 1,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Point-in-time view of the pool, served by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub idle_workers: usize,
    pub workers: usize,
    pub stats: StatsSnapshot,
}

/// Cheap, cloneable access to a running pool's queue and counters.
#[derive(Clone)]
pub struct PoolHandle {
    queue: AdmissionQueue,
    registry: WorkerRegistry,
    stats: Arc<PoolStats>,
    workers: usize,
}

impl PoolHandle {
    pub fn queue(&self) -> &AdmissionQueue {
        &self.queue
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            queue_depth: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            idle_workers: self.registry.idle_count(),
            workers: self.workers,
            stats: self.stats.snapshot(),
        }
    }
}

/// A fixed set of workers fed by one or more dispatchers.
///
/// The pool is sized once in [`WorkerPool::start`] and never resized.
pub struct WorkerPool {
    handle: PoolHandle,
    worker_shutdown: CancellationToken,
    dispatchers: Vec<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the workers and dispatchers onto the current tokio runtime.
    pub fn start(executor: Arc<CheckoutExecutor>, config: PoolConfig) -> Result<Self> {
        if config.dispatchers == 0 {
            return Err(CheckoutError::Config(
                "worker pool needs at least one dispatcher".to_string(),
            ));
        }
        let queue = AdmissionQueue::new(config.queue_capacity)?;
        let registry = WorkerRegistry::new(config.workers)?;
        let stats = Arc::new(PoolStats::default());
        let worker_shutdown = CancellationToken::new();

        let workers = (1..=config.workers)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    registry.clone(),
                    Arc::clone(&executor),
                    Arc::clone(&stats),
                    worker_shutdown.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        let dispatchers = (1..=config.dispatchers)
            .map(|id| tokio::spawn(Dispatcher::new(id, queue.clone(), registry.clone()).run()))
            .collect();

        info!(
            workers = config.workers,
            dispatchers = config.dispatchers,
            queue_capacity = config.queue_capacity,
            lock_strategy = ?executor.lock().strategy(),
            "worker pool started"
        );

        Ok(Self {
            handle: PoolHandle {
                queue,
                registry,
                stats,
                workers: config.workers,
            },
            worker_shutdown,
            dispatchers,
            workers,
        })
    }

    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    pub fn queue(&self) -> &AdmissionQueue {
        &self.handle.queue
    }

    pub fn status(&self) -> PoolStatus {
        self.handle.status()
    }

    /// Closes admission, dispatches whatever is already queued, lets every
    /// worker finish its job and joins all tasks.
    pub async fn shutdown(self) -> Result<StatsSnapshot> {
        self.handle.queue.close();
        for dispatcher in self.dispatchers {
            dispatcher
                .await
                .map_err(|e| CheckoutError::Internal(format!("dispatcher panicked: {}", e)))?;
        }

        self.worker_shutdown.cancel();
        for worker in self.workers {
            worker
                .await
                .map_err(|e| CheckoutError::Internal(format!("worker panicked: {}", e)))?;
        }

        let stats = self.handle.stats.snapshot();
        info!(processed = stats.processed(), "worker pool stopped");
        Ok(stats)
    }
}
