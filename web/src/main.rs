//! Storefront server binary.
//!
//! ```bash
//! DATABASE_URL=redis://127.0.0.1:6379 cargo run -p storefront-web
//! ```

use std::process::ExitCode;
use storefront_web::{AppConfig, serve};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_web=info,storefront_session=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Storefront failed to start");
            ExitCode::FAILURE
        }
    }
}
