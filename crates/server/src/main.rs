//! charterops-server: wires the store, rules, monitor and HTTP boundary.

mod api;
mod cli;
mod error;
mod router;
mod seed;
mod state;

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing::info;

use charterops_core::config::load_dotenv;
use charterops_core::Config;
use charterops_rules::StaticWeather;
use charterops_storage::MemoryStore;

use crate::cli::Cli;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let mut config = Config::for_profile(&cli.profile);
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.log_summary();

    let reference = config.reference_data()?;
    let store = Arc::new(MemoryStore::new());
    if cli.demo {
        seed::seed_demo(store.as_ref(), Utc::now()).await?;
    }

    let weather = Arc::new(StaticWeather::demo());
    let state = Arc::new(AppState::build(config, store, weather, reference)?);
    if !cli.no_monitor {
        state.monitor.start();
    }

    let app = router::build_router(Arc::clone(&state));
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("charterops-server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.monitor.stop();
    info!("charterops-server exited cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
