//! Transport selection with one-shot fallback.

use nuyou_config::EmailConfig;

use crate::message::{Mailbox, Message};
use crate::transport::{SendGridTransport, SendmailTransport, Transport};
use crate::{Delivery, MailError};

/// Sends messages through a primary transport with optional local fallback.
pub struct EmailService {
    primary: Option<Box<dyn Transport>>,
    local: Option<Box<dyn Transport>>,
    fallback: bool,
    default_from: Mailbox,
}

impl EmailService {
    /// Create a service with no transports.
    #[must_use]
    pub fn new(default_from: Mailbox) -> Self {
        Self {
            primary: None,
            local: None,
            fallback: true,
            default_from,
        }
    }

    /// Build the service described by the configuration.
    ///
    /// The API transport is only installed when the backend is the API and a
    /// key is present; the local transport is always available.
    #[must_use]
    pub fn from_config(config: &EmailConfig) -> Self {
        let mut service = Self::new(Mailbox::new(&config.from_email, &config.from_name))
            .with_local(SendmailTransport::new(&config.sendmail_path))
            .with_fallback(config.fallback);

        if config.api_enabled()
            && let Some(key) = config.sendgrid_api_key.as_deref()
        {
            service = service.with_primary(SendGridTransport::new(key, &config.sendgrid_url));
        }
        service
    }

    /// Set the primary transport.
    #[must_use]
    pub fn with_primary(mut self, transport: impl Transport + 'static) -> Self {
        self.primary = Some(Box::new(transport));
        self
    }

    /// Set the local transport.
    #[must_use]
    pub fn with_local(mut self, transport: impl Transport + 'static) -> Self {
        self.local = Some(Box::new(transport));
        self
    }

    /// Enable or disable falling back to the local transport.
    #[must_use]
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Name of the primary transport, if any.
    #[must_use]
    pub fn primary_name(&self) -> Option<&'static str> {
        self.primary.as_ref().map(|t| t.name())
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// With fallback disabled, the primary transport's error is returned
    /// unchanged. Otherwise the local transport's error is returned.
    pub fn send(&self, mut message: Message) -> Result<Delivery, MailError> {
        if message.from.is_none() {
            message.from = Some(self.default_from.clone());
        }

        if let Some(primary) = &self.primary {
            match primary.deliver(&message) {
                Ok(()) => {
                    tracing::info!(to = %message.to, transport = primary.name(), "Email sent");
                    return Ok(Delivery {
                        transport: primary.name(),
                    });
                }
                Err(e) if !self.fallback => {
                    tracing::error!(to = %message.to, error = %e, "Email delivery failed");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        to = %message.to,
                        error = %e,
                        "Primary email transport failed, falling back to local mail"
                    );
                }
            }
        }

        let local = self.local.as_ref().ok_or(MailError::NoTransport)?;
        local
            .deliver(&message)
            .inspect(|()| {
                tracing::info!(to = %message.to, transport = local.name(), "Email sent");
            })
            .inspect_err(|e| {
                tracing::error!(to = %message.to, error = %e, "Email delivery failed");
            })?;

        Ok(Delivery {
            transport: local.name(),
        })
    }

    /// Send an HTML message with the default sender.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<Delivery, MailError> {
        self.send(Message::new(to, subject, html).html())
    }
}
