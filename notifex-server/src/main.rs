//! # notifex server
//!
//! Webhook relay between an Emby media server and Telegram.
//!
//! Receives `library.new` webhooks, aggregates episode additions per
//! series season behind a sliding debounce window, and posts rendered
//! notifications (with optional TMDB posters/synopses) to a Telegram
//! chat. Movies are announced immediately. Pending groups are flushed on
//! shutdown so nothing buffered is lost.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notifex_config::{ConfigLoad, ConfigLoader};
use notifex_core::{Aggregator, NotificationSink, TelegramClient, TmdbProvider};
use notifex_server::{AppState, routes};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "notifex-server")]
#[command(about = "Emby library notification relay with episode aggregation")]
struct Cli {
    /// Listen host (overrides config)
    #[arg(long, env = "WEBHOOK_HOST")]
    host: Option<String>,

    /// Listen port (overrides config)
    #[arg(short, long, env = "WEBHOOK_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let ConfigLoad {
        mut config,
        warnings,
        env_file_loaded,
    } = ConfigLoader::load().context("failed to load configuration")?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    for warning in &warnings {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let telegram = TelegramClient::new(
        config.telegram.bot_token.clone(),
        config.telegram.chat_id.clone(),
    );
    let tmdb = config.tmdb.is_configured().then(|| {
        TmdbProvider::new(
            config.tmdb.api_key.clone(),
            config.tmdb.image_base_url.clone(),
        )
    });
    let sink = Arc::new(NotificationSink::new(telegram, tmdb));
    let aggregator = Arc::new(Aggregator::new(config.aggregation.delay, sink));

    info!(
        delay = ?config.aggregation.delay,
        "aggregation window configured"
    );

    let config = Arc::new(config);
    let state = AppState::new(Arc::clone(&aggregator), Arc::clone(&config));

    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "notifex server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Flush whatever is still buffered before the process exits.
    info!("shutting down, flushing pending notifications");
    aggregator.shutdown().await;
    info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
