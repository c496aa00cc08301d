use crate::domain::outcome::CheckoutOutcome;
use crate::domain::work::WorkItem;
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Queue depth used when nothing else is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A work item travelling through the pipeline, with an optional reply slot.
#[derive(Debug)]
pub struct Job {
    pub item: WorkItem,
    reply: Option<oneshot::Sender<Result<CheckoutOutcome>>>,
}

impl Job {
    /// A fire-and-forget job: its outcome is only logged.
    pub fn new(item: WorkItem) -> Self {
        Self { item, reply: None }
    }

    /// A job whose outcome is also delivered to the returned [`Receipt`].
    pub fn with_receipt(item: WorkItem) -> (Self, Receipt) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                item,
                reply: Some(tx),
            },
            Receipt(rx),
        )
    }

    /// Hands the result to whoever holds the receipt, if anyone still does.
    pub fn complete(self, result: Result<CheckoutOutcome>) {
        if let Some(reply) = self.reply {
            let _ = reply.send(result);
        }
    }
}

/// Resolves to the outcome of one submitted item.
#[derive(Debug)]
pub struct Receipt(oneshot::Receiver<Result<CheckoutOutcome>>);

impl Receipt {
    /// Waits for the item to be processed.
    ///
    /// Fails with [`CheckoutError::QueueClosed`] if the item was dropped before
    /// any worker ran it (only possible during shutdown).
    pub async fn outcome(self) -> Result<CheckoutOutcome> {
        self.0.await.map_err(|_| CheckoutError::QueueClosed)?
    }
}

/// Bounded FIFO buffer between the HTTP layer and the dispatchers.
///
/// `enqueue` waits while the queue is full, `dequeue` waits while it is empty.
/// Clones share the same buffer.
#[derive(Clone)]
pub struct AdmissionQueue {
    sender: mpsc::Sender<Job>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    capacity: usize,
    closed: CancellationToken,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CheckoutError::Config(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        let (sender, receiver) = mpsc::channel(capacity);
        Ok(Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            capacity,
            closed: CancellationToken::new(),
        })
    }

    /// Appends `item`, waiting for a free slot if the queue is full.
    pub async fn enqueue(&self, item: WorkItem) -> Result<()> {
        self.push(Job::new(item)).await
    }

    /// Like [`enqueue`](Self::enqueue), but also returns a receipt for the outcome.
    pub async fn submit(&self, item: WorkItem) -> Result<Receipt> {
        let (job, receipt) = Job::with_receipt(item);
        self.push(job).await?;
        Ok(receipt)
    }

    /// Appends `item` only if a slot is free right now.
    pub fn try_enqueue(&self, item: WorkItem) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(CheckoutError::QueueClosed);
        }
        self.sender.try_send(Job::new(item)).map_err(|e| match e {
            TrySendError::Full(_) => CheckoutError::QueueFull,
            TrySendError::Closed(_) => CheckoutError::QueueClosed,
        })
    }

    async fn push(&self, job: Job) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(CheckoutError::QueueClosed);
        }
        tokio::select! {
            sent = self.sender.send(job) => sent.map_err(|_| CheckoutError::QueueClosed),
            _ = self.closed.cancelled() => Err(CheckoutError::QueueClosed),
        }
    }

    /// Removes the head of the queue, waiting while it is empty.
    ///
    /// After [`close`](Self::close) the remaining items are still handed out;
    /// `None` means the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<Job> {
        let mut receiver = self.receiver.lock().await;
        if self.closed.is_cancelled() {
            return drain_one(&mut receiver);
        }
        tokio::select! {
            biased;
            job = receiver.recv() => job,
            _ = self.closed.cancelled() => drain_one(&mut receiver),
        }
    }

    /// Stops accepting new items. Producers blocked on a full queue are released
    /// with [`CheckoutError::QueueClosed`].
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Number of items currently buffered.
    pub fn len(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn drain_one(receiver: &mut mpsc::Receiver<Job>) -> Option<Job> {
    match receiver.try_recv() {
        Ok(job) => Some(job),
        Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::work::Amount;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn item(cart_id: &str) -> WorkItem {
        WorkItem::new(cart_id, Amount::new(dec!(1.0)).unwrap())
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = AdmissionQueue::new(10).unwrap();
        queue.enqueue(item("a")).await.unwrap();
        queue.enqueue(item("b")).await.unwrap();
        queue.enqueue(item("c")).await.unwrap();
        assert_eq!(queue.len(), 3);

        let order: Vec<String> = [
            queue.dequeue().await.unwrap(),
            queue.dequeue().await.unwrap(),
            queue.dequeue().await.unwrap(),
        ]
        .into_iter()
        .map(|job| job.item.cart_id)
        .collect();

        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_blocks_when_full() {
        let queue = AdmissionQueue::new(1).unwrap();
        queue.enqueue(item("a")).await.unwrap();

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(item("b")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished(), "producer must wait for a free slot");

        assert_eq!(queue.dequeue().await.unwrap().item.cart_id, "a");
        tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("producer should be released by the dequeue")
            .unwrap()
            .unwrap();
        assert_eq!(queue.dequeue().await.unwrap().item.cart_id, "b");
    }

    #[tokio::test]
    async fn test_try_enqueue_reports_full() {
        let queue = AdmissionQueue::new(1).unwrap();
        queue.try_enqueue(item("a")).unwrap();
        assert!(matches!(
            queue.try_enqueue(item("b")),
            Err(CheckoutError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = AdmissionQueue::new(4).unwrap();
        queue.enqueue(item("a")).await.unwrap();
        queue.close();

        assert!(matches!(
            queue.enqueue(item("b")).await,
            Err(CheckoutError::QueueClosed)
        ));
        assert_eq!(queue.dequeue().await.unwrap().item.cart_id, "a");
        assert!(queue.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_consumer() {
        let queue = AdmissionQueue::new(4).unwrap();
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        let job = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            AdmissionQueue::new(0),
            Err(CheckoutError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_receipt_reports_dropped_job() {
        let (job, receipt) = Job::with_receipt(item("a"));
        drop(job);
        assert!(matches!(
            receipt.outcome().await,
            Err(CheckoutError::QueueClosed)
        ));
    }
}
