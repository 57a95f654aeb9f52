//! Session state endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::error::ServerError;
use crate::session::{Session, session_cookie};
use crate::state::AppState;

/// Response for GET /api/session.
#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    /// Token to echo on state-changing requests.
    csrf_token: String,
    /// Whether admin mode is active.
    admin: bool,
}

/// Handle GET /api/session.
///
/// This is where sessions start: a caller without a live session gets a
/// fresh one and its cookie.
pub(crate) async fn get_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    session: Option<Extension<Session>>,
) -> Result<(CookieJar, Json<SessionResponse>), ServerError> {
    let (session, jar) = match session {
        Some(Extension(session)) => (session, jar),
        None => {
            let session = state.sessions.create(Instant::now()).ok_or(
                ServerError::Unavailable("Too many active sessions. Please try again later."),
            )?;
            let jar = jar.add(session_cookie(&session));
            (session, jar)
        }
    };

    Ok((
        jar,
        Json(SessionResponse {
            admin: state.admin.is_authorized(&session),
            csrf_token: session.csrf_token,
        }),
    ))
}
