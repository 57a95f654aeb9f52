//! Static file serving.
//!
//! Uploaded images are served from the upload directory under their public
//! URL prefix. When a public directory is configured, it backs every path
//! the API does not handle.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Mount upload serving and the optional site fallback onto `router`.
pub(crate) fn mount(
    router: Router<Arc<AppState>>,
    upload_prefix: &str,
    upload_dir: &Path,
    public_dir: Option<&Path>,
) -> Router<Arc<AppState>> {
    let router = if upload_prefix.is_empty() || upload_prefix == "/" {
        router
    } else {
        router.nest_service(upload_prefix, ServeDir::new(upload_dir))
    };

    match public_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
