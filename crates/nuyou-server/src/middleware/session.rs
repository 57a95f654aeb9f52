//! Session and admin-activation middleware.
//!
//! A request whose cookie names a live session gets a [`Session`]
//! extension; nothing is allocated for any other request. A `GET` carrying
//! `?admin=<secret>` turns admin mode on (starting a session if needed) and
//! `?logout=true` turns it off; both redirect to the same path without the
//! query so the secret does not linger in the address bar or history. A
//! wrong secret is ignored and the request proceeds normally.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::session::{SESSION_COOKIE, Session, session_cookie};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct AdminQuery {
    admin: Option<String>,
    logout: Option<String>,
}

/// Attach the caller's session and apply admin activation.
pub(crate) async fn session_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let now = Instant::now();
    let session = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value(), now));

    if req.method() == Method::GET
        && let Some((target, started)) = activate(&state, session.as_ref(), &req, now)
    {
        let jar = match started {
            Some(started) => jar.add(session_cookie(&started)),
            None => jar,
        };
        return (jar, Redirect::to(&target)).into_response();
    }

    if let Some(session) = session {
        req.extensions_mut().insert(session);
    }
    next.run(req).await
}

/// Apply `?admin=` / `?logout=`.
///
/// Returns the redirect target when the admin state changed, along with the
/// session started for it, if any.
fn activate(
    state: &AppState,
    session: Option<&Session>,
    req: &Request,
    now: Instant,
) -> Option<(String, Option<Session>)> {
    let query = Query::<AdminQuery>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let path = req.uri().path().to_owned();

    if query.logout.as_deref() == Some("true") {
        if let Some(session) = session {
            state.sessions.set_admin(&session.id, false);
            tracing::info!("Admin mode deactivated");
        }
        return Some((path, None));
    }

    let candidate = query.admin?;
    if !state.admin.secret_matches(&candidate) {
        tracing::warn!(path = %path, "Rejected admin activation attempt");
        return None;
    }

    let (id, started) = match session {
        Some(session) => (session.id.clone(), None),
        None => {
            let started = state.sessions.create(now)?;
            (started.id.clone(), Some(started))
        }
    };
    state.sessions.set_admin(&id, true);
    tracing::info!("Admin mode activated");
    Some((path, started))
}
