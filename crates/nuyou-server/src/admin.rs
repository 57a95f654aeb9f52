//! Admin authorization policy.
//!
//! Secrets and CSRF tokens are compared in constant time. The configured
//! secret is stored only as a SHA-256 digest and candidates are hashed before
//! comparison, so neither the content nor the length of the secret affects
//! timing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::session::Session;

/// Decides who may edit content.
#[derive(Clone)]
pub(crate) struct AdminGate {
    secret_digest: Option<[u8; 32]>,
}

impl AdminGate {
    /// Create a gate. An unset or empty secret disables admin mode.
    pub(crate) fn new(secret: Option<&str>) -> Self {
        Self {
            secret_digest: secret.filter(|s| !s.is_empty()).map(digest),
        }
    }

    /// Whether admin mode can be activated at all.
    pub(crate) fn enabled(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Compare a candidate against the configured secret.
    pub(crate) fn secret_matches(&self, candidate: &str) -> bool {
        self.secret_digest
            .is_some_and(|expected| bool::from(digest(candidate)[..].ct_eq(&expected[..])))
    }

    /// Whether the session is in admin mode.
    pub(crate) fn is_authorized(&self, session: &Session) -> bool {
        self.enabled() && session.admin
    }

    /// Check a submitted CSRF token against the session's token.
    pub(crate) fn verify_csrf(&self, session: &Session, token: Option<&str>) -> bool {
        token.is_some_and(|token| {
            bool::from(token.as_bytes().ct_eq(session.csrf_token.as_bytes()))
        })
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.enabled())
            .finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
