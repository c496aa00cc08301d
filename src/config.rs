use crate::application::lock::LockStrategy;
use crate::application::pool::PoolConfig;
use crate::application::queue::DEFAULT_QUEUE_CAPACITY;
use crate::domain::product::Product;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Console output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where the executor reads current product counters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProductSource {
    /// The remote product service.
    #[default]
    Http,
    /// The same store the reservation ledger writes to.
    Store,
}

/// Asynchronous checkout service.
///
/// Every option can also be set through the environment (or a `.env` file in
/// the working directory).
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Port the admission endpoint listens on.
    #[arg(long, env = "SERVER_PORT", default_value_t = 3005)]
    pub port: u16,

    /// Number of checkout workers.
    #[arg(long, env = "CHECKOUT_WORKERS", default_value_t = 4, value_parser = positive)]
    pub workers: usize,

    /// Number of dispatcher loops feeding the workers.
    #[arg(long, env = "CHECKOUT_DISPATCHERS", default_value_t = 1, value_parser = positive)]
    pub dispatchers: usize,

    /// Maximum number of queued checkout requests before producers wait.
    #[arg(long, env = "CHECKOUT_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY, value_parser = positive)]
    pub queue_capacity: usize,

    /// Locking discipline for the stock-check-and-reserve section.
    #[arg(long, env = "CHECKOUT_LOCK_STRATEGY", value_enum, default_value_t = LockStrategy::Global)]
    pub lock_strategy: LockStrategy,

    /// Postgres connection string. Without it, inventory is kept in memory.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Base URL of the cart service.
    #[arg(long, env = "CART_SERVICE_URL", default_value = "http://localhost:3006/cart/api/v1")]
    pub cart_service_url: String,

    /// Base URL of the product service.
    #[arg(long, env = "PRODUCT_SERVICE_URL", default_value = "http://localhost:3004/product/api/v1")]
    pub product_service_url: String,

    /// Where current stock counters are read from.
    #[arg(long, env = "PRODUCT_SOURCE", value_enum, default_value_t = ProductSource::Http)]
    pub product_source: ProductSource,

    /// Request timeout for cart and product lookups, in milliseconds.
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = 5000)]
    pub upstream_timeout_ms: u64,

    /// Simulated payment round trip, in milliseconds.
    #[arg(long, env = "PAYMENT_LATENCY_MS", default_value_t = 2)]
    pub payment_latency_ms: u64,

    /// Seed a product as `id=quantity`. May be repeated.
    #[arg(long = "seed", value_name = "ID=QTY", value_parser = parse_seed)]
    pub seeds: Vec<Product>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn listen_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            dispatchers: self.dispatchers,
            queue_capacity: self.queue_capacity,
        }
    }

    /// True when stock is read from the product service but the in-memory
    /// ledger would start empty, so no checkout could ever reserve anything.
    pub fn unseeded_http_catalog(&self) -> bool {
        self.product_source == ProductSource::Http && self.seeds.is_empty()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn payment_latency(&self) -> Duration {
        Duration::from_millis(self.payment_latency_ms)
    }
}

fn positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_seed(value: &str) -> Result<Product, String> {
    let (id, qty) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ID=QTY, got `{}`", value))?;
    let id = id.trim();
    if id.is_empty() {
        return Err("product id must not be empty".to_string());
    }
    let qty = qty
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity `{}`: {}", qty, e))?;
    Ok(Product::new(id, i64::from(qty)))
}
