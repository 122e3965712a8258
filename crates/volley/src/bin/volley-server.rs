//! Runs the Volley server.
//!
//! `VOLLEY_BIND` sets the listen address (default `0.0.0.0:3000`) and
//! `RUST_LOG` the log filter (default `info`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volley::prelude::*;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), VolleyError> {
    init_tracing();

    let bind = std::env::var("VOLLEY_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let server = VolleyServer::builder().bind(&bind).build().await?;
    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening"),
        Err(e) => tracing::warn!(error = %e, "could not read bound address"),
    }

    server.run_until(shutdown_signal()).await
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
