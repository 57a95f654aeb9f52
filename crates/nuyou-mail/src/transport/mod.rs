//! Delivery mechanisms.

mod sendgrid;
mod sendmail;

pub use sendgrid::SendGridTransport;
pub use sendmail::SendmailTransport;

use crate::MailError;
use crate::message::Message;

/// Something that can deliver a [`Message`].
///
/// Implementations are blocking; callers on an async runtime should run them
/// on a blocking thread.
pub trait Transport: Send + Sync {
    /// Short human-readable name used in logs and success messages.
    fn name(&self) -> &'static str;

    /// Deliver a message. The sender is always set by the time this is called.
    fn deliver(&self, message: &Message) -> Result<(), MailError>;
}

/// Remove line breaks so a value cannot inject extra headers.
pub(crate) fn header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}
