//! Contact form endpoint.
//!
//! Each check below is a hard stop with its own message:
//!
//! | Check                       | Status |
//! |-----------------------------|--------|
//! | method is POST              | 405    |
//! | honeypot empty              | 400    |
//! | CSRF token valid            | 403    |
//! | name, email, message given  | 400    |
//! | privacy consent             | 400    |
//! | email syntax                | 400    |
//! | under the rate limit        | 429    |
//! | delivery                    | 200 / 502 |

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use axum::extract::{ConnectInfo, Form, FromRequest, Multipart, Request, State};
use axum::http::{Method, header};
use axum::{Extension, Json};
use chrono::Utc;
use nuyou_mail::{ContactSubmission, send_contact_form_email};
use regex::Regex;

use super::Ack;
use crate::error::ServerError;
use crate::session::Session;
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid regex")
});

/// Submitted form fields, keyed by name.
type Fields = HashMap<String, String>;

/// Handle /api/contact.
pub(crate) async fn submit(
    State(state): State<Arc<AppState>>,
    session: Option<Extension<Session>>,
    req: Request,
) -> Result<Json<Ack>, ServerError> {
    if req.method() != Method::POST {
        return Err(ServerError::MethodNotAllowed("Invalid request method."));
    }

    let ip = client_ip(&req);
    let fields = read_fields(req, &state).await?;
    let field = |name: &str| {
        fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    // Any content at all, whitespace included, marks a bot
    if fields.get("honeypot").is_some_and(|v| !v.is_empty()) {
        tracing::warn!(%ip, "Contact submission flagged as spam");
        return Err(ServerError::BadRequest("Spam detected.".to_owned()));
    }

    let token = fields.get("csrf_token").map(String::as_str);
    let Some(Extension(session)) = session.filter(|s| state.admin.verify_csrf(s, token)) else {
        tracing::warn!(%ip, "Contact submission with invalid CSRF token");
        return Err(ServerError::Forbidden(
            "Security validation failed. Please refresh and try again.",
        ));
    };

    let (Some(name), Some(email), Some(message)) =
        (field("name"), field("email"), field("message"))
    else {
        return Err(ServerError::BadRequest(
            "Please fill in all required fields.".to_owned(),
        ));
    };

    if !field("privacy").is_some_and(consent_given) {
        return Err(ServerError::BadRequest(
            "Please accept the privacy policy to continue.".to_owned(),
        ));
    }

    if !is_valid_email(email) {
        return Err(ServerError::BadRequest(
            "Please provide a valid email address.".to_owned(),
        ));
    }

    let Some(permit) = state.limiter.try_acquire(ip, Instant::now()) else {
        tracing::warn!(%ip, "Contact submission rate limit reached");
        return Err(ServerError::TooManyRequests(
            "Too many submissions. Please try again later.",
        ));
    };

    let submission = ContactSubmission {
        name: name.to_owned(),
        email: email.to_owned(),
        phone: field("mobile").or_else(|| field("phone")).map(str::to_owned),
        service: field("service").map(str::to_owned),
        message: message.to_owned(),
        ip,
        submitted_at: Utc::now(),
    };

    let mail = Arc::clone(&state.mail);
    let settings = state.contact.clone();
    let result = tokio::task::spawn_blocking(move || {
        send_contact_form_email(&mail, &submission, &settings)
    })
    .await;

    match result {
        Ok(Ok(delivery)) => {
            tracing::info!(%ip, transport = delivery.transport, "Contact submission delivered");
            // A token is good for one delivered submission
            state.sessions.rotate_csrf(&session.id);
            Ok(Json(Ack::new(state.messages.success.clone())))
        }
        Ok(Err(e)) => {
            tracing::error!(%ip, error = %e, "Contact submission not delivered");
            state.limiter.release(permit);
            Err(ServerError::BadGateway(state.messages.error.clone()))
        }
        Err(e) => {
            tracing::error!(%ip, error = %e, "Contact delivery task failed");
            state.limiter.release(permit);
            Err(ServerError::BadGateway(state.messages.error.clone()))
        }
    }
}

/// Read urlencoded or multipart form fields.
async fn read_fields(req: Request, state: &Arc<AppState>) -> Result<Fields, ServerError> {
    let invalid = || ServerError::BadRequest("Invalid form data.".to_owned());

    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(fields) = Form::<Fields>::from_request(req, state)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Unreadable contact form");
                invalid()
            })?;
        return Ok(fields);
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|_| invalid())?;
    let mut fields = Fields::new();
    while let Some(field) = multipart.next_field().await.map_err(|_| invalid())? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await.map_err(|_| invalid())?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

fn consent_given(value: &str) -> bool {
    ["on", "true", "1", "yes"]
        .iter()
        .any(|v| value.eq_ignore_ascii_case(v))
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_RE.is_match(email)
}
