//! HTTP boundary for cpuwatch.
//!
//! Serves the latest per-process CPU averages as JSON plus the static
//! dashboard that polls them.

pub mod assets;
pub mod error;

pub use error::ApiError;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use cpuwatch_core::{ProcessRecord, SnapshotProvider};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// Shared server state.
struct AppState {
    provider:   Arc<dyn SnapshotProvider>,
    static_dir: PathBuf,
}

impl AppState {
    /// Providers may touch the disk and the process table, so keep them off
    /// the async workers.
    async fn processes(&self) -> Result<Vec<ProcessRecord>, ApiError> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || provider.current_processes())
            .await
            .map_err(|e| ApiError::Task(e.to_string()))?
            .map_err(ApiError::from)
    }
}

async fn handle_cpu_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProcessRecord>>, ApiError> {
    state.processes().await.map(Json)
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    serve_asset(&state, assets::DASHBOARD).await
}

async fn handle_static(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    serve_asset(&state, &name).await
}

async fn serve_asset(state: &AppState, name: &str) -> Result<Response, ApiError> {
    let (mime, body) = assets::load(&state.static_dir, name).await?;
    Ok(([(header::CONTENT_TYPE, mime)], body).into_response())
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (status, tracked) = match state.processes().await {
        Ok(records) => ("ok", Some(records.len())),
        Err(_) => ("degraded", None),
    };
    Json(serde_json::json!({
        "status": status,
        "tracked": tracked,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_unknown() -> ApiError {
    ApiError::NotFound
}

/// Build the axum router.
pub fn build_router(provider: Arc<dyn SnapshotProvider>, static_dir: impl Into<PathBuf>) -> Router {
    let state = Arc::new(AppState {
        provider,
        static_dir: static_dir.into(),
    });

    Router::new()
        .route("/cpu_usage", get(handle_cpu_usage))
        .route("/cpu_usage/", get(handle_cpu_usage))
        .route("/stats", get(handle_stats))
        .route("/stats/", get(handle_stats))
        .route("/static/{name}", get(handle_static))
        .route("/health", get(handle_health))
        .fallback(handle_unknown)
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` turns `true`.
///
/// New connections stop being accepted at that point; in-flight requests are
/// allowed to finish.
pub async fn run_server(
    listener: TcpListener,
    app: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow_and_update() {
                // Sender gone counts as a stop signal too.
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}
