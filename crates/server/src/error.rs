use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use cpuwatch_core::CpuWatchError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to HTTP clients as status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown request")]
    NotFound,

    #[error("cannot read asset '{}': {source}", path.display())]
    Asset {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot unavailable: {0}")]
    Snapshot(#[from] CpuWatchError),

    #[error("snapshot task failed: {0}")]
    Task(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Asset { .. } | Self::Snapshot(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
