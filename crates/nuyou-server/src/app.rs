//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{any, get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{security, session};
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/session", get(handlers::session::get_session))
        .route("/api/content/{page}", get(handlers::content::get_content))
        .route("/api/admin/save", any(handlers::content::save))
        .route(
            "/api/admin/upload",
            post(handlers::upload::upload)
                .layer(DefaultBodyLimit::max(handlers::upload::UPLOAD_BODY_LIMIT)),
        )
        .route("/api/contact", any(handlers::contact::submit));

    let router = static_files::mount(
        api_routes,
        state.uploads.url_prefix(),
        state.uploads.dir(),
        state.public_dir.as_deref(),
    );

    let router = router.layer(from_fn_with_state(
        Arc::clone(&state),
        session::session_middleware,
    ));

    security::header_layers()
        .fold(router, |router, layer| router.layer(layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
