//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use nuyou_content::ContentStore;
use nuyou_mail::{ContactSettings, EmailService};
use nuyou_media::ImageUploads;

use crate::admin::AdminGate;
use crate::rate_limit::RateLimiter;
use crate::session::SessionStore;

/// Messages shown after a contact submission.
#[derive(Debug, Clone)]
pub(crate) struct ContactMessages {
    pub(crate) success: String,
    pub(crate) error: String,
}

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Page documents.
    pub(crate) content: ContentStore,
    /// Upload target.
    pub(crate) uploads: ImageUploads,
    /// Admin policy.
    pub(crate) admin: AdminGate,
    /// Server-side sessions.
    pub(crate) sessions: SessionStore,
    /// Contact submission limiter.
    pub(crate) limiter: RateLimiter,
    /// Outgoing mail. Shared with blocking tasks.
    pub(crate) mail: Arc<EmailService>,
    /// Contact notification routing.
    pub(crate) contact: ContactSettings,
    /// Contact response texts.
    pub(crate) messages: ContactMessages,
    /// Static site served for non-API paths.
    pub(crate) public_dir: Option<PathBuf>,
}
