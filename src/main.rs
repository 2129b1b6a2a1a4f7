use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeboard_api::{gateway, AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "codeboard-api starting in {} mode on port {}",
        config.mode.as_str(),
        config.port
    );

    let state = AppState::new(config);
    if let Err(e) = gateway::serve(state).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
