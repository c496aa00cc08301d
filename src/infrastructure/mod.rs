//! Outbound adapters: storage, remote collaborators and the payment stand-in.

pub mod http;
pub mod in_memory;
pub mod payment;
#[cfg(feature = "storage-postgres")]
pub mod postgres;
