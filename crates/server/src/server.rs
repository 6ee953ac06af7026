use axum::{
    Json, Router, middleware,
    routing::{get, patch, post},
};
use api_types::Message;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use std::{sync::Arc, time::Duration};

use crate::{
    accounts, auth,
    auth::TokenKeys,
    categorizer::CategorizerClient,
    topup, transactions,
};
use engine::Engine;

/// Runtime settings of the HTTP API.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub categorizer_url: String,
    pub categorizer_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_ttl: Duration::from_secs(30 * 60),
            categorizer_url: "http://127.0.0.1:9000".to_string(),
            categorizer_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub(crate) tokens: TokenKeys,
    pub(crate) categorizer: CategorizerClient,
}

impl ServerState {
    pub fn new(engine: Engine, config: &ServerConfig) -> Result<Self, std::io::Error> {
        let ttl = chrono::Duration::from_std(config.token_ttl).map_err(std::io::Error::other)?;
        let categorizer =
            CategorizerClient::new(&config.categorizer_url, config.categorizer_timeout)
                .map_err(std::io::Error::other)?;

        Ok(Self {
            engine: Arc::new(engine),
            tokens: TokenKeys::new(&config.jwt_secret, ttl),
            categorizer,
        })
    }
}

async fn root() -> Json<Message> {
    Json(Message {
        message: "Top-up API is running".to_string(),
    })
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route("/accounts/{id}", get(accounts::get))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/topup-rules",
            get(topup::list_rules).post(topup::create_rule),
        )
        .route("/topup-rules/{id}", patch(topup::update_rule))
        .route("/topup-events", get(topup::list_events))
        .route("/trigger-topup", post(topup::trigger))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/demo-login", post(auth::demo_login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, &config)?;

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
