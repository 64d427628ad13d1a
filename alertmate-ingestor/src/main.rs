//! alertmate-ingestor - HTTP endpoint for relayed notifications
//!
//! Accepts `POST /ingest` bodies from alertmate devices, validates them and
//! logs each accepted record. Point a device at it with:
//!
//! ```text
//! alertmate endpoint set http://<host>:8082/ingest
//! ```

use anyhow::{Context, Result};
use axum::http::Request;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use alertmate_ingestor::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "alertmate-ingestor")]
#[command(about = "Ingestion endpoint for alertmate notification relays")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8082")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new();
    let app = router(state.clone()).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "starting ingestor");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    tracing::info!(
        accepted = state.accepted(),
        rejected = state.rejected(),
        "ingestor stopped"
    );

    Ok(())
}
