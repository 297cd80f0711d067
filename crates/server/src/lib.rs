//! Finance Tracker Server Library
//!
//! Accounts, income/expense/transaction records and an AI advice proxy
//! behind a JSON HTTP API.

pub mod core;
pub mod finance;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::auth::token::TokenService;
use crate::core::auth::CredentialStore;
use crate::core::{AppState, ServerConfig};
use crate::finance::advisor::AdviceProxy;
use crate::finance::store::RecordStores;

pub const API_PREFIX: &str = "/api/v1";

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "finance_server=debug,tower_http=info,info".into());

    // Already set (tests, embedding); ignore
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Open every store and build the shared state
pub async fn build_state(config: ServerConfig) -> anyhow::Result<AppState> {
    config.ensure_dirs().await?;

    let auth = Arc::new(CredentialStore::new(&config.database_url, config.bcrypt_cost).await?);

    let records = Arc::new(RecordStores::open(&config.data_dir).await?);
    info!("Record stores ready: {:?}", config.data_dir);

    let advisor = AdviceProxy::from_config(&config).map(Arc::new);
    if advisor.is_none() {
        info!("[Advisor] No LLM_API_KEY set, chatbot disabled");
    }

    Ok(AppState {
        tokens: Arc::new(TokenService::new(&config.jwt_secret)),
        config: Arc::new(config),
        auth,
        records,
        advisor,
    })
}

pub fn app(state: AppState) -> Router {
    let api = crate::core::router(state.clone()).merge(finance::router(state.clone()));

    Router::new()
        .nest(API_PREFIX, api)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

pub async fn run() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    info!("=== Finance Tracker Server ===");

    let config = ServerConfig::from_env()?;
    info!("{:?}", config);

    let port = config.port;
    let state = build_state(config).await?;
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK - Finance Tracker Server"
}
