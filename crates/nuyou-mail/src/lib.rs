//! Email delivery for the nuyou site backend.
//!
//! [`EmailService`] sends a [`Message`] through a primary API transport when
//! one is configured and falls back to local mail delivery once when that
//! fails (unless fallback is disabled). Contact-form composition lives in
//! [`send_contact_form_email`].
//!
//! All transports are blocking. From async code, call into this crate on the
//! blocking pool.

mod contact;
mod message;
mod service;
pub mod transport;

pub use contact::{ContactSettings, ContactSubmission, send_contact_form_email};
pub use message::{Mailbox, Message};
pub use service::EmailService;
pub use transport::Transport;

use std::fmt;

/// Mail delivery error.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The API could not be reached (DNS, TLS, timeout, refused).
    #[error("SendGrid connection error: {0}")]
    Connection(String),

    /// The API answered with a non-2xx status.
    #[error("SendGrid API error (HTTP {status}){}", detail_suffix(detail.as_deref()))]
    Api {
        /// HTTP status code.
        status: u16,
        /// First error message from the response body.
        detail: Option<String>,
    },

    /// The local mail program failed.
    #[error("Local mail delivery failed: {0}")]
    Local(String),

    /// Message has no sender and the service has no default.
    #[error("Message has no sender")]
    MissingSender,

    /// Neither an API nor a local transport is configured.
    #[error("No email transport configured")]
    NoTransport,

    /// Payload encoding failed.
    #[error("Failed to encode email payload: {0}")]
    Json(#[from] serde_json::Error),
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

/// Successful delivery report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Name of the transport that accepted the message.
    pub transport: &'static str,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email sent successfully via {}", self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_error_display() {
        let with_detail = MailError::Api {
            status: 401,
            detail: Some("The provided authorization grant is invalid".to_owned()),
        };
        assert_eq!(
            with_detail.to_string(),
            "SendGrid API error (HTTP 401): The provided authorization grant is invalid"
        );

        let bare = MailError::Api {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.to_string(), "SendGrid API error (HTTP 500)");
    }

    #[test]
    fn test_delivery_display() {
        let delivery = Delivery {
            transport: "SendGrid",
        };
        assert_eq!(delivery.to_string(), "Email sent successfully via SendGrid");
    }
}
