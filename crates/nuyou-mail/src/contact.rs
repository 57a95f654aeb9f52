//! Contact-form notification and confirmation emails.

use std::fmt::Write as _;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::message::Message;
use crate::service::EmailService;
use crate::{Delivery, MailError};

/// A validated contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    /// Submitter's name.
    pub name: String,
    /// Submitter's email address.
    pub email: String,
    /// Phone number, if given.
    pub phone: Option<String>,
    /// Selected service, if the form offers one.
    pub service: Option<String>,
    /// Free-form message.
    pub message: String,
    /// Client address.
    pub ip: IpAddr,
    /// Receipt time.
    pub submitted_at: DateTime<Utc>,
}

/// Where contact notifications go and how the site signs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSettings {
    /// Notification recipient.
    pub to: String,
    /// Blind-copy recipients.
    pub bcc: Vec<String>,
    /// Site name used in subjects and signatures.
    pub site_name: String,
    /// Phone number offered in the confirmation email.
    pub site_phone: Option<String>,
}

/// Notify the site owner of a submission.
///
/// On success a confirmation is also sent to the submitter; failure of that
/// second email is logged and does not change the result.
///
/// # Errors
///
/// Returns the delivery error of the notification email.
pub fn send_contact_form_email(
    service: &EmailService,
    submission: &ContactSubmission,
    settings: &ContactSettings,
) -> Result<Delivery, MailError> {
    let notification = Message::new(
        &settings.to,
        format!("New Contact Form Submission - {}", settings.site_name),
        notification_body(submission),
    )
    .reply_to(&submission.email)
    .bcc(&settings.bcc);

    let delivery = service.send(notification)?;

    let confirmation = Message::new(
        &submission.email,
        format!("Thank you for contacting {}", settings.site_name),
        confirmation_body(&submission.name, settings),
    );
    if let Err(e) = service.send(confirmation) {
        tracing::warn!(to = %submission.email, error = %e, "Failed to send contact confirmation");
    }

    Ok(delivery)
}

fn notification_body(submission: &ContactSubmission) -> String {
    let mut body = String::from("New contact form submission:\n\n");
    let _ = writeln!(body, "Name: {}", submission.name);
    let _ = writeln!(body, "Email: {}", submission.email);
    let _ = writeln!(
        body,
        "Phone: {}",
        submission.phone.as_deref().unwrap_or("Not provided")
    );
    if let Some(service) = &submission.service {
        let _ = writeln!(body, "Service: {service}");
    }
    let _ = writeln!(body, "Message:\n{}", submission.message);
    body.push_str("\n---\n");
    let _ = writeln!(
        body,
        "Submitted on: {}",
        submission.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(body, "IP Address: {}", submission.ip);
    body
}

fn confirmation_body(name: &str, settings: &ContactSettings) -> String {
    let site = &settings.site_name;
    let mut body = format!("Dear {name},\n\n");
    let _ = writeln!(
        body,
        "Thank you for contacting {site}. We have received your message and will respond as soon as possible.\n"
    );
    if let Some(phone) = &settings.site_phone {
        let _ = writeln!(
            body,
            "If you need immediate assistance, please call us on {phone}.\n"
        );
    }
    body.push_str("Kind regards,\n");
    let _ = writeln!(body, "The {site} Team\n");
    body.push_str("---\nThis is an automated response to confirm we have received your message.\n");
    body
}
