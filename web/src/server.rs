//! Process startup: wire the store, sessions and views, then serve.

use crate::config::AppConfig;
use crate::error::StartupError;
use crate::router::{RouteGroups, build_app};
use crate::state::AppState;
use crate::views::Views;
use storefront_session::{CookieSigner, Database, RedisSessionStore, SessionManager};
use tokio::net::TcpListener;

/// Connect to the session store, build the pipeline and serve until a
/// shutdown signal arrives.
///
/// A store that cannot be reached at startup is logged and retried on first
/// use; everything else that goes wrong here stops the process.
///
/// # Errors
///
/// Returns [`StartupError`] if the store URL is unusable, the views cannot be
/// loaded, the port cannot be bound, or the server fails.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    let session_config = config.session_config();

    let database = Database::connect(&config.database.url, config.database.name.clone()).await?;
    let store = RedisSessionStore::new(database, &session_config.collection);

    if config.session.secret_is_default {
        tracing::warn!("SESSION_SECRET is not set, using the built-in development secret");
    }
    let signer = CookieSigner::new(&config.session.secret)?;

    let views = Views::from_dir(&config.assets.views_dir)?;
    let address = config.bind_address();

    tracing::info!(
        environment = %config.environment,
        secure_cookies = session_config.secure,
        store_ttl_secs = session_config.store_ttl.num_seconds(),
        cookie_max_age_secs = session_config.cookie_max_age.num_seconds(),
        "Configuration loaded"
    );

    let sessions = SessionManager::new(store, signer, session_config);
    let app = build_app(AppState::new(config, views), sessions, RouteGroups::default());

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, "Storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
