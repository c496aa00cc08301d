//! Application layer: the concurrent checkout pipeline.
//!
//! Requests enter through the [`queue::AdmissionQueue`], are paired with idle
//! workers by the [`dispatcher::Dispatcher`], and are executed by the
//! [`worker::Worker`]s of a [`pool::WorkerPool`] through the shared
//! [`executor::CheckoutExecutor`].

pub mod dispatcher;
pub mod executor;
pub mod lock;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod stats;
pub mod worker;
