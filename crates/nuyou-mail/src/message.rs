//! Outgoing message types.

use std::fmt;

/// An address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

impl Mailbox {
    /// Create a mailbox with a display name.
    #[must_use]
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// Create a mailbox without a display name.
    #[must_use]
    pub fn address(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if !name.is_empty() => write!(f, "{name} <{}>", self.email),
            _ => f.write_str(&self.email),
        }
    }
}

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Body text (plain or HTML, see `html`).
    pub body: String,
    /// Sender. Filled with the service default when `None`.
    pub from: Option<Mailbox>,
    /// Reply-To address.
    pub reply_to: Option<String>,
    /// Blind-copy recipients.
    pub bcc: Vec<String>,
    /// Whether `body` is HTML.
    pub html: bool,
}

impl Message {
    /// Create a plain-text message.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
            reply_to: None,
            bcc: Vec::new(),
            html: false,
        }
    }

    /// Set the sender.
    #[must_use]
    pub fn from(mut self, from: Mailbox) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Add blind-copy recipients. Blank entries are skipped.
    #[must_use]
    pub fn bcc<I, S>(mut self, bcc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bcc.extend(
            bcc.into_iter()
                .map(|s| s.as_ref().trim().to_owned())
                .filter(|s| !s.is_empty()),
        );
        self
    }

    /// Mark the body as HTML.
    #[must_use]
    pub fn html(mut self) -> Self {
        self.html = true;
        self
    }

    /// MIME type of the body.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        if self.html { "text/html" } else { "text/plain" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mailbox_display() {
        assert_eq!(
            Mailbox::new("a@example.com", "Site").to_string(),
            "Site <a@example.com>"
        );
        assert_eq!(Mailbox::address("a@example.com").to_string(), "a@example.com");
        assert_eq!(Mailbox::new("a@example.com", "").to_string(), "a@example.com");
    }

    #[test]
    fn test_builder() {
        let msg = Message::new("to@example.com", "Hi", "Body")
            .reply_to("r@example.com")
            .bcc([" b1@example.com ", "", "b2@example.com"])
            .html();

        assert_eq!(msg.reply_to.as_deref(), Some("r@example.com"));
        assert_eq!(msg.bcc, vec!["b1@example.com", "b2@example.com"]);
        assert_eq!(msg.content_type(), "text/html");
        assert_eq!(msg.from, None);
    }
}
