//! Insight
//!
//! HTTP report server and template warm-up runner.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use insight_kernel::{AppState, Config, routes};

#[derive(Parser)]
#[command(name = "insight", version, about = "Diagnostics reports for a CMS host")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the report API (default).
    Serve,
    /// Resolve every template's warm-up URL and ping it once.
    Warmup,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!("Database connection established");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, state).await,
        Command::Warmup => warmup(state).await,
    }
}

async fn serve(config: &Config, state: AppState) -> Result<()> {
    let app = routes::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn warmup(state: AppState) -> Result<()> {
    // Ctrl-C stops the scan after the current node
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping warm-up");
            on_signal.cancel();
        }
    });

    let urls = state
        .reports()
        .template_urls(state.resolver(), state.warmup_options(), cancel)
        .await
        .context("failed to list warm-up nodes")?;

    let outcomes = state.pinger().ping_all(urls).await;
    for outcome in &outcomes {
        match (outcome.status, &outcome.error) {
            (Some(status), _) => println!("{status} {}ms {}", outcome.elapsed_ms, outcome.url),
            (None, Some(error)) => println!("ERR {}ms {} ({error})", outcome.elapsed_ms, outcome.url),
            (None, None) => println!("ERR {}ms {}", outcome.elapsed_ms, outcome.url),
        }
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(total = outcomes.len(), succeeded, "warm-up finished");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
