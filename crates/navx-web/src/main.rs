mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use navx_backtest::{BacktestService, EtfProfile};
use navx_core::{ProviderConfig, TushareClient};

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(config) = ProviderConfig::from_env() else {
        eprintln!("error: TUSHARE_TOKEN is not set");
        std::process::exit(2);
    };

    let client = Arc::new(TushareClient::new(config));
    let service = Arc::new(BacktestService::new(client, EtfProfile::default()));
    let state = AppState { service };

    let static_dir =
        std::env::var("NAVX_STATIC_DIR").unwrap_or_else(|_| String::from("static"));

    let app = Router::new()
        .route("/api/backtest/custom", post(routes::custom_backtest))
        .route("/api/backtest/etf", post(routes::etf_backtest))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = match std::env::var("NAVX_ADDR")
        .unwrap_or_else(|_| String::from("0.0.0.0:3000"))
        .parse()
    {
        Ok(addr) => addr,
        Err(error) => {
            eprintln!("error: invalid NAVX_ADDR: {error}");
            std::process::exit(2);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            eprintln!("error: failed to bind {addr}: {error}");
            std::process::exit(10);
        }
    };

    info!(%addr, "navx listening");
    if let Err(error) = axum::serve(listener, app).await {
        eprintln!("error: server terminated: {error}");
        std::process::exit(10);
    }
}
