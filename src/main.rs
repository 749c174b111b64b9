use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use push_activity::{app, config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "push_activity=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let port = match args.command {
        Some(cli::Commands::Serve { port }) => port.unwrap_or(cfg.port),
        None => cfg.port,
    };

    if cfg.management_auth.is_none() {
        tracing::warn!("management API credentials are not set; /activity/templates will fail");
    }
    if cfg.push_auth.is_none() {
        tracing::warn!("push API credentials are not set; /activity/execute will fail");
    }

    let state = Arc::new(AppState::new(cfg));
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("push activity backend listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
