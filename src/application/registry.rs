use super::queue::Job;
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};

/// An idle worker waiting for exactly one job.
#[derive(Debug)]
pub struct IdleWorker {
    pub id: usize,
    slot: oneshot::Sender<Job>,
}

impl IdleWorker {
    /// Hands `job` to the worker. Gives the job back if the worker is gone.
    pub fn assign(self, job: Job) -> std::result::Result<(), Job> {
        self.slot.send(job)
    }
}

/// Free-list of idle workers.
///
/// A worker publishes itself when it is ready for work and receives, through
/// the one-shot slot it published, the single job a dispatcher picked for it.
/// Each worker has at most one entry at a time, so the buffer never exceeds
/// the pool size.
#[derive(Clone)]
pub struct WorkerRegistry {
    sender: mpsc::Sender<IdleWorker>,
    receiver: Arc<Mutex<mpsc::Receiver<IdleWorker>>>,
    idle: Arc<AtomicUsize>,
}

impl WorkerRegistry {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(CheckoutError::Config(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        let (sender, receiver) = mpsc::channel(workers);
        Ok(Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            idle: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Advertises worker `id` as idle and returns where its next job will arrive.
    pub async fn publish(&self, id: usize) -> Result<oneshot::Receiver<Job>> {
        let (slot, assignment) = oneshot::channel();
        self.idle.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(IdleWorker { id, slot }).await.is_err() {
            self.idle.fetch_sub(1, Ordering::SeqCst);
            return Err(CheckoutError::Internal("worker registry closed".to_string()));
        }
        Ok(assignment)
    }

    /// Takes any idle worker, waiting until one is published.
    pub async fn take(&self) -> Option<IdleWorker> {
        let worker = self.receiver.lock().await.recv().await;
        if worker.is_some() {
            self.idle.fetch_sub(1, Ordering::SeqCst);
        }
        worker
    }

    /// Workers currently advertised as idle.
    pub fn idle_count(&self) -> usize {
        self.idle.load(Ordering::SeqCst)
    }
}
