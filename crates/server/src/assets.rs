use crate::error::ApiError;
use std::path::Path;

/// Page served at `/stats`.
pub const DASHBOARD: &str = "stats.html";

/// Content type for the asset kinds the dashboard is made of.
/// Anything else is not served.
pub fn content_type(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext {
        "html" => Some("text/html; charset=utf-8"),
        "css"  => Some("text/css; charset=utf-8"),
        "js"   => Some("application/javascript; charset=utf-8"),
        _      => None,
    }
}

/// Read a flat file from the static directory.
///
/// Names with path separators or an unsupported extension are unroutable
/// (404). A supported file that cannot be read is a server error (500).
pub async fn load(static_dir: &Path, name: &str) -> Result<(&'static str, Vec<u8>), ApiError> {
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ApiError::NotFound);
    }
    let mime = content_type(name).ok_or(ApiError::NotFound)?;

    let path = static_dir.join(name);
    let body = tokio::fs::read(&path)
        .await
        .map_err(|source| ApiError::Asset { path, source })?;
    Ok((mime, body))
}
