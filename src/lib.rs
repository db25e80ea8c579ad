//! # Leaderboard
//!
//! Score submissions keyed by player email, served back as a top-10 ranking
//! of each player's best score.
//!
//! ## Endpoints
//!
//! - `GET /api/leaderboard`: up to 10 `{name, email, score}` objects, best
//!   score first.
//! - `POST /api/leaderboard`: `{name, email, score}` in, `{ok, rank}` out.
//!   Rejections are `{error}` with status 400.
//! - `GET /`: the static front page.
//!
//! ## Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `LEADERBOARD_HOST` | `0.0.0.0` |
//! | `LEADERBOARD_PORT` | `5000` |
//! | `LEADERBOARD_DB` | `leaderboard.db` |
//! | `LEADERBOARD_STATIC` | `static` |
//!
//! Logging follows `RUST_LOG`, defaulting to `info`.
//!
//! Create the schema without serving:
//! ```sh
//! cargo run --bin migrate
//! ```
use std::path::Path;

use axum::{routing::get, Router};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod migrate;
pub mod models;
pub mod routes;
pub mod serializers;
pub mod state;
pub mod store;

use config::Config;
use error::ServerError;
use routes::{leaderboard_handler, submit_handler};
use state::AppState;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).init();
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route(
            "/api/leaderboard",
            get(leaderboard_handler).post(submit_handler),
        )
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<(), ServerError> {
    init_tracing();

    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::open(&config.database_path).await?;

    info!("Starting server...");
    let app = router(state, &config.static_dir);

    let address = config.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
