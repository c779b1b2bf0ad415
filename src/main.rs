//! Task Board API entry point.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::{api, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Starting Task Board API v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr()
    );

    api::serve(config).await
}
