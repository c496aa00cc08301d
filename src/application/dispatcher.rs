use super::queue::{AdmissionQueue, Job};
use super::registry::WorkerRegistry;
use tracing::{debug, info, warn};

/// Pairs queued jobs with idle workers.
///
/// Jobs are taken from the admission queue strictly in arrival order; each one
/// is handed to whichever worker is idle first. The loop ends once the queue
/// is closed and drained.
pub struct Dispatcher {
    id: usize,
    queue: AdmissionQueue,
    registry: WorkerRegistry,
}

impl Dispatcher {
    pub fn new(id: usize, queue: AdmissionQueue, registry: WorkerRegistry) -> Self {
        Self {
            id,
            queue,
            registry,
        }
    }

    pub async fn run(self) {
        info!(dispatcher_id = self.id, "dispatcher started");
        while let Some(job) = self.queue.dequeue().await {
            debug!(dispatcher_id = self.id, cart_id = %job.item.cart_id, "received work request");
            if !self.hand_off(job).await {
                break;
            }
        }
        info!(dispatcher_id = self.id, "dispatcher stopped");
    }

    // Returns false if no worker can ever take the job.
    async fn hand_off(&self, mut job: Job) -> bool {
        loop {
            let Some(worker) = self.registry.take().await else {
                warn!(dispatcher_id = self.id, cart_id = %job.item.cart_id, "no workers left, dropping job");
                return false;
            };
            let worker_id = worker.id;
            match worker.assign(job) {
                Ok(()) => {
                    debug!(dispatcher_id = self.id, worker_id, "dispatched work request");
                    return true;
                }
                Err(returned) => {
                    debug!(dispatcher_id = self.id, worker_id, "worker went away, retrying");
                    job = returned;
                }
            }
        }
    }
}
