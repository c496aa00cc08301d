use crate::domain::ports::{LedgerTx, LedgerTxBox, ProductCatalog, ReservationLedger};
use crate::domain::product::Product;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Row, Transaction};

const CREATE_PRODUCT_TABLE: &str = "CREATE TABLE IF NOT EXISTS product (\
     id TEXT PRIMARY KEY, \
     available_qty BIGINT NOT NULL DEFAULT 0, \
     reserved_qty BIGINT NOT NULL DEFAULT 0, \
     CONSTRAINT product_reserved_non_negative CHECK (reserved_qty >= 0), \
     CONSTRAINT product_sellable_non_negative CHECK (available_qty - reserved_qty >= 0))";

/// Product counters stored in a Postgres `product` table.
///
/// Implements the reservation ledger over `sqlx` transactions and a product
/// reader over committed rows. Clones share the connection pool.
#[derive(Clone)]
pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    /// Connects to the database at `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - A `postgres://` connection string.
    /// * `max_connections` - Pool size; one connection per worker is enough.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `product` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_PRODUCT_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts a product or overwrites its counters.
    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO product (id, available_qty, reserved_qty) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET available_qty = EXCLUDED.available_qty, reserved_qty = EXCLUDED.reserved_qty",
        )
        .bind(&product.id)
        .bind(product.available_qty)
        .bind(product.reserved_qty)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for PgInventory {
    async fn find_product(&self, product_id: &str) -> Result<Product> {
        let row = sqlx::query("SELECT id, available_qty, reserved_qty FROM product WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CheckoutError::Upstream(e.to_string()))?
            .ok_or_else(|| CheckoutError::Upstream(format!("Product {} not found", product_id)))?;

        Ok(Product {
            id: row.get("id"),
            available_qty: row.get("available_qty"),
            reserved_qty: row.get("reserved_qty"),
        })
    }
}

#[async_trait]
impl ReservationLedger for PgInventory {
    async fn begin(&self) -> Result<LedgerTxBox> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    async fn exec(&mut self, sql: &str, product_id: &str, quantity: u32) -> Result<u64> {
        let result = sqlx::query(sql)
            .bind(i64::from(quantity))
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}

fn expect_one_row(affected: u64, operation: &str, product_id: &str) -> Result<()> {
    if affected == 1 {
        Ok(())
    } else {
        Err(CheckoutError::Persistence(format!(
            "{} of product {} updated {} rows",
            operation, product_id, affected
        )))
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn reserve(&mut self, product_id: &str, quantity: u32) -> Result<bool> {
        let affected = self
            .exec(
                "UPDATE product SET reserved_qty = reserved_qty + $1 \
                 WHERE id = $2 AND available_qty - reserved_qty >= $1",
                product_id,
                quantity,
            )
            .await?;
        if affected == 1 {
            return Ok(true);
        }

        // Zero rows means either too little stock or no such row.
        let exists = sqlx::query("SELECT 1 FROM product WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .is_some();
        if exists {
            Ok(false)
        } else {
            Err(CheckoutError::Persistence(format!(
                "Product {} not found in ledger",
                product_id
            )))
        }
    }

    async fn release(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let affected = self
            .exec(
                "UPDATE product SET reserved_qty = reserved_qty - $1 WHERE id = $2",
                product_id,
                quantity,
            )
            .await?;
        expect_one_row(affected, "release", product_id)
    }

    async fn finalize(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let affected = self
            .exec(
                "UPDATE product SET available_qty = available_qty - $1, \
                 reserved_qty = reserved_qty - $1 WHERE id = $2",
                product_id,
                quantity,
            )
            .await?;
        expect_one_row(affected, "finalize", product_id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
