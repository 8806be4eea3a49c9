use clap::Parser;
use tracing::info;

use huddle::config::{RelayArgs, RelayConfig};
use huddle::signaling::{SignalingError, SignalingServer};

#[tokio::main]
async fn main() -> Result<(), SignalingError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huddle=info".into()),
        )
        .init();

    let config = RelayConfig::from(RelayArgs::parse());

    println!("   Huddle Signaling Relay");
    println!("   Binding to {}", config.bind_addr);
    println!("   Press Ctrl+C to stop\n");

    let server = SignalingServer::bind(&config).await?;
    let registry = server.registry();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            if let Ok(stats) = registry.stats().await {
                info!("Shutting down with {} rooms, {} sessions", stats.rooms, stats.sessions);
            }
        }
    }

    Ok(())
}
