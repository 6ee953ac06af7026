//! Transaction categorization service.
//!
//! [`categorize`] holds the keyword rules; [`router`] exposes them over HTTP
//! as `GET /health` and `POST /categorize`.

use api_types::categorize::{CategorizeRequest, CategorizeResponse, Health};
use axum::{
    Json, Router,
    routing::{get, post},
};

pub use rules::{Category, categorize};

mod rules;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categorize", post(categorize_handler))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        service: "categorizer".to_string(),
    })
}

async fn categorize_handler(Json(payload): Json<CategorizeRequest>) -> Json<CategorizeResponse> {
    let category = categorize(
        &payload.merchant,
        payload.description.as_deref(),
        payload.amount_minor,
        payload.kind,
    );
    tracing::debug!(
        merchant = %payload.merchant,
        amount_minor = payload.amount_minor,
        %category,
        "transaction categorized"
    );

    Json(CategorizeResponse {
        category: category.to_string(),
    })
}

pub async fn run_with_listener(listener: tokio::net::TcpListener) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Categorizer listening on {}", addr);

    axum::serve(listener, router()).await
}
