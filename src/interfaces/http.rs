//! HTTP admission: turns checkout requests into queued work items.
//!
//! ## Routes
//!
//! - `POST /checkout-service/api/v1/checkout/`: body `{"cart_id": "...", "amount": 12.5}`.
//!   Answers `202 Accepted` as soon as the item is queued; the checkout itself
//!   runs later and its outcome is only logged.
//! - `GET /health`: queue depth, idle workers and outcome counters.

use crate::application::pool::PoolHandle;
use crate::domain::work::WorkItem;
use crate::error::{CheckoutError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use tracing::{info, warn};

pub const CHECKOUT_PATH: &str = "/checkout-service/api/v1/checkout/";

const BAD_BODY_MESSAGE: &str = "Please specify correct request body";

/// Builds the admission router on top of a running pool.
pub fn router(pool: PoolHandle) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(CHECKOUT_PATH, post(checkout_handler))
        .route(CHECKOUT_PATH.trim_end_matches('/'), post(checkout_handler))
        .with_state(pool)
}

/// Serves the admission router on `addr` until `shutdown` resolves.
pub async fn serve<F>(pool: PoolHandle, addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "checkout service listening");
    axum::serve(listener, router(pool))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Parses and validates a checkout body.
pub fn parse_body(body: &[u8]) -> Result<WorkItem> {
    let item: WorkItem = serde_json::from_slice(body)
        .map_err(|e| CheckoutError::Validation(e.to_string()))?;
    item.validate()
}

async fn health_handler(State(pool): State<PoolHandle>) -> impl IntoResponse {
    let status = pool.status();
    Json(json!({
        "ok": !pool.queue().is_closed(),
        "queue_depth": status.queue_depth,
        "queue_capacity": status.queue_capacity,
        "idle_workers": status.idle_workers,
        "workers": status.workers,
        "stats": status.stats,
    }))
}

async fn checkout_handler(State(pool): State<PoolHandle>, body: Bytes) -> Response {
    let item = match parse_body(&body) {
        Ok(item) => item,
        Err(e) => {
            warn!(error = %e, "rejecting checkout request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": BAD_BODY_MESSAGE })),
            )
                .into_response();
        }
    };

    let cart_id = item.cart_id.clone();
    match pool.queue().enqueue(item).await {
        Ok(()) => {
            info!(cart_id = %cart_id, "checkout request queued");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "accepted", "cart_id": cart_id })),
            )
                .into_response()
        }
        Err(e) => {
            warn!(cart_id = %cart_id, error = %e, "checkout request not queued");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
