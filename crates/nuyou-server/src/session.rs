//! Server-side sessions.
//!
//! The browser only holds a random session id in the `nuyou_session` cookie.
//! Everything else (CSRF token, admin flag) stays in an in-process map.
//!
//! Sessions are only started where one is needed: `GET /api/session` and a
//! successful admin activation. Other requests merely look up the cookie, so
//! static files and cookieless clients never allocate anything. Idle records
//! are swept at most once per [`SWEEP_INTERVAL`], and no more than
//! [`MAX_SESSIONS`] are kept alive.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::RngCore;

/// Session cookie name.
pub(crate) const SESSION_COOKIE: &str = "nuyou_session";

/// Idle time after which a session is forgotten.
pub(crate) const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum time between two sweeps of idle records.
pub(crate) const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on live sessions.
pub(crate) const MAX_SESSIONS: usize = 10_000;

/// Snapshot of a session, attached to each request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    /// Session id (cookie value).
    pub(crate) id: String,
    /// Per-session CSRF token.
    pub(crate) csrf_token: String,
    /// Whether admin mode is active.
    pub(crate) admin: bool,
}

#[derive(Debug)]
struct Record {
    csrf_token: String,
    admin: bool,
    last_seen: Instant,
}

impl Record {
    fn snapshot(&self, id: &str) -> Session {
        Session {
            id: id.to_owned(),
            csrf_token: self.csrf_token.clone(),
            admin: self.admin,
        }
    }
}

#[derive(Debug)]
struct Records {
    by_id: HashMap<String, Record>,
    last_sweep: Instant,
}

/// In-memory session store.
#[derive(Debug)]
pub(crate) struct SessionStore {
    records: Mutex<Records>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub(crate) fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            records: Mutex::new(Records {
                by_id: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            ttl,
            capacity,
        }
    }

    /// Look up a live session and mark it as used.
    ///
    /// Never creates anything; an unknown or expired id yields `None`.
    pub(crate) fn get(&self, id: &str, now: Instant) -> Option<Session> {
        let mut records = self.lock();
        self.sweep_if_due(&mut records, now);

        let record = records.by_id.get_mut(id)?;
        if now.saturating_duration_since(record.last_seen) > self.ttl {
            records.by_id.remove(id);
            return None;
        }
        record.last_seen = now;
        Some(record.snapshot(id))
    }

    /// Start a new session.
    ///
    /// Returns `None` when the store is full.
    pub(crate) fn create(&self, now: Instant) -> Option<Session> {
        let mut records = self.lock();
        self.sweep_if_due(&mut records, now);

        if records.by_id.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "Session store is full");
            return None;
        }

        let id = random_token();
        let record = Record {
            csrf_token: random_token(),
            admin: false,
            last_seen: now,
        };
        let session = record.snapshot(&id);
        records.by_id.insert(id, record);
        tracing::debug!("Started new session");
        Some(session)
    }

    /// Set or clear the admin flag. Unknown ids are ignored.
    pub(crate) fn set_admin(&self, id: &str, admin: bool) {
        if let Some(record) = self.lock().by_id.get_mut(id) {
            record.admin = admin;
        }
    }

    /// Replace the session's CSRF token, returning the new one.
    pub(crate) fn rotate_csrf(&self, id: &str) -> Option<String> {
        let mut records = self.lock();
        let record = records.by_id.get_mut(id)?;
        record.csrf_token = random_token();
        Some(record.csrf_token.clone())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep_if_due(&self, records: &mut Records, now: Instant) {
        if now.saturating_duration_since(records.last_sweep) < SWEEP_INTERVAL {
            return;
        }
        let before = records.by_id.len();
        records
            .by_id
            .retain(|_, r| now.saturating_duration_since(r.last_seen) <= self.ttl);
        records.last_sweep = now;
        tracing::debug!(removed = before - records.by_id.len(), "Swept idle sessions");
    }
}

/// Cookie carrying the session id.
pub(crate) fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// 32 random bytes, hex encoded.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
