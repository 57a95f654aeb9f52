//! Admin image upload endpoint.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::{Extension, Json};
use nuyou_media::StoredImage;
use serde::Serialize;

use super::header_token;
use crate::error::ServerError;
use crate::session::Session;
use crate::state::AppState;

/// Request body limit for uploads; the image itself is capped lower.
pub(crate) const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

const NO_FILE: &str = "No file uploaded or upload error";

/// Response for POST /api/admin/upload.
#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    success: bool,
    message: &'static str,
    file: StoredImage,
}

struct ImageField {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Handle POST /api/admin/upload.
///
/// The body is only read after the admin check.
pub(crate) async fn upload(
    State(state): State<Arc<AppState>>,
    session: Option<Extension<Session>>,
    req: Request,
) -> Result<Json<UploadResponse>, ServerError> {
    let Some(Extension(session)) = session.filter(|s| state.admin.is_authorized(s)) else {
        tracing::warn!("Upload attempted without admin mode");
        return Err(ServerError::Unauthorized);
    };

    let header_csrf = header_token(req.headers()).map(str::to_owned);
    let mut multipart = Multipart::from_request(req, &state)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Upload body is not multipart");
            ServerError::BadRequest(NO_FILE.to_owned())
        })?;

    let mut image = None;
    let mut form_csrf = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::info!(error = %e, "Failed to read upload");
                return Err(ServerError::BadRequest(NO_FILE.to_owned()));
            }
        };

        match field.name() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::info!(error = %e, "Failed to read upload");
                    ServerError::BadRequest(NO_FILE.to_owned())
                })?;
                image = Some(ImageField {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("csrf_token") => {
                form_csrf = field.text().await.ok();
            }
            _ => {}
        }
    }

    let token = form_csrf.as_deref().or(header_csrf.as_deref());
    if !state.admin.verify_csrf(&session, token) {
        tracing::warn!("Upload rejected: invalid CSRF token");
        return Err(ServerError::Unauthorized);
    }

    let image = image
        .filter(|i| !i.bytes.is_empty())
        .ok_or_else(|| ServerError::BadRequest(NO_FILE.to_owned()))?;

    let stored = state
        .uploads
        .store(&image.file_name, &image.content_type, &image.bytes)?;

    Ok(Json(UploadResponse {
        success: true,
        message: "Image uploaded successfully",
        file: stored,
    }))
}
