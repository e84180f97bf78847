use lobbyforge::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: &str = "8000";

/// Resolves the listen address: `LOBBY_BIND` wins, otherwise all
/// interfaces on `PORT` (default 8000).
fn bind_addr(lobby_bind: Option<String>, port: Option<String>) -> String {
    if let Some(addr) = lobby_bind.filter(|a| !a.trim().is_empty()) {
        return addr;
    }
    let port = port
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    format!("0.0.0.0:{port}")
}

/// `RUST_LOG` overrides the default of `info` for the lobby crates.
fn setup_logger(default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "lobbyforge={default_log_level},lobby_server={default_log_level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger("info");

    let addr = bind_addr(
        std::env::var("LOBBY_BIND").ok(),
        std::env::var("PORT").ok(),
    );
    let server = LobbyServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "lobby server listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;
    Ok(())
}
