//! Content read and save endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::{Extension, Json};
use nuyou_content::{apply_fields, validate_page_name};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Ack, header_token};
use crate::error::ServerError;
use crate::session::Session;
use crate::state::AppState;

/// Body of POST /api/admin/save.
#[derive(Debug, Deserialize)]
struct SaveRequest {
    page: Option<String>,
    fields: Option<Map<String, Value>>,
    csrf_token: Option<String>,
}

/// Handle GET /api/content/{page}.
pub(crate) async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
) -> Json<Value> {
    Json(state.content.load(&page))
}

/// Handle /api/admin/save.
///
/// Authorization is checked before the method so that probing the endpoint
/// without admin mode always yields 403.
pub(crate) async fn save(
    State(state): State<Arc<AppState>>,
    session: Option<Extension<Session>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, ServerError> {
    let Some(Extension(session)) = session.filter(|s| state.admin.is_authorized(s)) else {
        tracing::warn!("Save attempted without admin mode");
        return Err(ServerError::Unauthorized);
    };

    if method != Method::POST {
        return Err(ServerError::MethodNotAllowed("Method not allowed"));
    }

    let request: SaveRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid JSON: {e}")))?;

    let token = request.csrf_token.as_deref().or_else(|| header_token(&headers));
    if !state.admin.verify_csrf(&session, token) {
        tracing::warn!("Save rejected: invalid CSRF token");
        return Err(ServerError::Unauthorized);
    }

    let (Some(page), Some(fields)) = (request.page, request.fields) else {
        return Err(ServerError::BadRequest("Missing required fields".to_owned()));
    };

    if validate_page_name(&page).is_err() {
        return Err(ServerError::BadRequest("Invalid page name".to_owned()));
    }

    tracing::debug!(page = %page, fields = fields.len(), "Applying content edits");
    let doc = apply_fields(state.content.load(&page), fields);

    state
        .content
        .save(&page, &doc)
        .map_err(|_| ServerError::Internal("Failed to save content"))?;

    Ok(Json(Ack::new("Content saved successfully")))
}
