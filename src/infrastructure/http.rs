use crate::domain::ports::{CartService, ProductCatalog};
use crate::domain::product::{CartSnapshot, Product};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Response envelope shared by the sibling order-management services.
///
/// Only `result` is used; the other fields are informational.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CartPayload {
    #[serde(default)]
    products: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
struct CartLine {
    id: String,
    quantity: u32,
}

/// Builds the shared HTTP client used by the collaborator adapters.
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

async fn fetch<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    let resp = client.get(url).send().await.map_err(|e| {
        CheckoutError::Upstream(format!("{} unavailable: {}", url, e))
    })?;

    if !resp.status().is_success() {
        return Err(CheckoutError::Upstream(format!(
            "{} returned {}",
            url,
            resp.status()
        )));
    }

    let envelope = resp
        .json::<Envelope<T>>()
        .await
        .map_err(|e| CheckoutError::Upstream(format!("Invalid response from {}: {}", url, e)))?;

    envelope.result.ok_or_else(|| {
        let reason = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "empty result".to_string());
        CheckoutError::Upstream(format!("{}: {}", url, reason))
    })
}

/// Cart lookup over `GET {base_url}/find/{cart_id}`.
#[derive(Clone)]
pub struct HttpCartService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCartService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CartService for HttpCartService {
    async fn find_cart(&self, cart_id: &str) -> Result<CartSnapshot> {
        let url = format!("{}/find/{}", self.base_url, cart_id);
        let cart: CartPayload = fetch(&self.client, &url).await?;

        // Carts hold a single product; anything after the first line is ignored.
        let line = cart
            .products
            .into_iter()
            .next()
            .ok_or_else(|| CheckoutError::Upstream(format!("Cart {} has no products", cart_id)))?;

        if line.quantity == 0 {
            return Err(CheckoutError::Upstream(format!(
                "Cart {} requests zero units of {}",
                cart_id, line.id
            )));
        }

        Ok(CartSnapshot {
            product_id: line.id,
            quantity: line.quantity,
        })
    }
}

/// Product lookup over `GET {base_url}/find/{product_id}`.
#[derive(Clone)]
pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn find_product(&self, product_id: &str) -> Result<Product> {
        let url = format!("{}/find/{}", self.base_url, product_id);
        fetch(&self.client, &url).await
    }
}
