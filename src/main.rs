use clap::Parser;
use miette::{IntoDiagnostic, Result};
use oms_checkout::application::executor::CheckoutExecutor;
use oms_checkout::application::lock::InventoryLock;
use oms_checkout::application::pool::WorkerPool;
use oms_checkout::config::{Config, ProductSource};
use oms_checkout::domain::ports::{
    CartServiceBox, PaymentGatewayBox, ProductCatalogBox, ReservationLedgerBox,
};
use oms_checkout::infrastructure::http::{self, HttpCartService, HttpProductCatalog};
use oms_checkout::infrastructure::in_memory::InMemoryInventory;
use oms_checkout::infrastructure::payment::SimulatedPaymentGateway;
use oms_checkout::{interfaces, logging};
use std::sync::Arc;

type Storage = (ReservationLedgerBox, ProductCatalogBox);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();
    let config = Config::parse();
    logging::init(config.log_format);

    let client = http::client(config.upstream_timeout()).into_diagnostic()?;
    let (ledger, store_catalog) = open_storage(&config).await?;

    let catalog: ProductCatalogBox = match config.product_source {
        ProductSource::Http => Box::new(HttpProductCatalog::new(
            client.clone(),
            &config.product_service_url,
        )),
        ProductSource::Store => store_catalog,
    };
    let carts: CartServiceBox = Box::new(HttpCartService::new(client, &config.cart_service_url));
    let payments: PaymentGatewayBox =
        Box::new(SimulatedPaymentGateway::approving(config.payment_latency()));

    let executor = Arc::new(CheckoutExecutor::new(
        ledger,
        carts,
        catalog,
        payments,
        InventoryLock::new(config.lock_strategy),
    ));
    let pool = WorkerPool::start(executor, config.pool_config()).into_diagnostic()?;

    interfaces::http::serve(pool.handle(), &config.listen_address(), shutdown_signal())
        .await
        .into_diagnostic()?;

    pool.shutdown().await.into_diagnostic()?;
    Ok(())
}

async fn open_storage(config: &Config) -> Result<Storage> {
    if let Some(url) = config.database_url.as_deref()
        && let Some(storage) = open_database(url, config).await?
    {
        return Ok(storage);
    }

    if config.unseeded_http_catalog() {
        tracing::warn!(
            "in-memory inventory has no products while stock is read from the product service; \
             every checkout will fail until products are seeded with --seed"
        );
    }
    let inventory = InMemoryInventory::with_products(config.seeds.clone());
    let ledger: ReservationLedgerBox = Box::new(inventory.clone());
    let catalog: ProductCatalogBox = Box::new(inventory);
    Ok((ledger, catalog))
}

#[cfg(feature = "storage-postgres")]
async fn open_database(url: &str, config: &Config) -> Result<Option<Storage>> {
    use oms_checkout::infrastructure::postgres::PgInventory;

    // One connection per worker plus one for catalog reads.
    let max_connections = u32::try_from(config.workers + 1).unwrap_or(u32::MAX);
    let inventory = PgInventory::connect(url, max_connections)
        .await
        .into_diagnostic()?;
    inventory.ensure_schema().await.into_diagnostic()?;
    for product in &config.seeds {
        inventory.upsert_product(product).await.into_diagnostic()?;
    }
    let ledger: ReservationLedgerBox = Box::new(inventory.clone());
    let catalog: ProductCatalogBox = Box::new(inventory);
    Ok(Some((ledger, catalog)))
}

#[cfg(not(feature = "storage-postgres"))]
async fn open_database(_url: &str, _config: &Config) -> Result<Option<Storage>> {
    eprintln!(
        "WARNING: Persistent storage requested via --database-url, but 'storage-postgres' feature is not enabled. Falling back to In-Memory storage."
    );
    Ok(None)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining queued checkouts");
}
