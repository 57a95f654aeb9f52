//! Local mail transport.
//!
//! Pipes an RFC 5322 message into `sendmail -t -i`, which reads recipients
//! from the headers and does not treat a lone `.` line as end of input.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{Transport, header_value};
use crate::MailError;
use crate::message::Message;

/// Local `sendmail` transport.
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    program: PathBuf,
}

impl SendmailTransport {
    /// Create a transport invoking `program`.
    #[must_use]
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }
}

impl Transport for SendmailTransport {
    fn name(&self) -> &'static str {
        "local mail"
    }

    fn deliver(&self, message: &Message) -> Result<(), MailError> {
        let raw = compose(message)?;

        let mut child = Command::new(&self.program)
            .args(["-t", "-i"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MailError::Local(format!("{}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits without reading is judged by its exit status
            match stdin.write_all(raw.as_bytes()) {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(MailError::Local(e.to_string()));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| MailError::Local(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MailError::Local(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Render the message with headers. Header values have line breaks removed.
fn compose(message: &Message) -> Result<String, MailError> {
    let from = message.from.as_ref().ok_or(MailError::MissingSender)?;

    let mut raw = String::new();
    push_header(&mut raw, "From", &from.to_string());
    push_header(&mut raw, "To", &message.to);
    if let Some(reply_to) = &message.reply_to {
        push_header(&mut raw, "Reply-To", reply_to);
    }
    if !message.bcc.is_empty() {
        push_header(&mut raw, "Bcc", &message.bcc.join(", "));
    }
    push_header(&mut raw, "Subject", &message.subject);
    push_header(&mut raw, "MIME-Version", "1.0");
    push_header(
        &mut raw,
        "Content-Type",
        &format!("{}; charset=UTF-8", message.content_type()),
    );
    raw.push_str("\r\n");
    raw.push_str(&message.body);
    if !message.body.ends_with('\n') {
        raw.push_str("\r\n");
    }
    Ok(raw)
}

fn push_header(raw: &mut String, name: &str, value: &str) {
    raw.push_str(name);
    raw.push_str(": ");
    raw.push_str(&header_value(value));
    raw.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Mailbox;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compose() {
        let msg = Message::new("to@example.com", "Hello", "Body text")
            .from(Mailbox::new("noreply@example.com", "Site"))
            .reply_to("visitor@example.com")
            .bcc(["a@example.com", "b@example.com"]);

        assert_eq!(
            compose(&msg).unwrap(),
            "From: Site <noreply@example.com>\r\n\
             To: to@example.com\r\n\
             Reply-To: visitor@example.com\r\n\
             Bcc: a@example.com, b@example.com\r\n\
             Subject: Hello\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             \r\n\
             Body text\r\n"
        );
    }

    #[test]
    fn test_compose_blocks_header_injection() {
        let msg = Message::new("to@example.com", "Hi\r\nBcc: everyone@example.com", "B")
            .from(Mailbox::address("noreply@example.com"))
            .reply_to("x@example.com\nX-Evil: 1");

        let raw = compose(&msg).unwrap();
        let headers: Vec<&str> = raw.split("\r\n\r\n").next().unwrap().split("\r\n").collect();

        assert!(headers.iter().all(|h| !h.starts_with("Bcc")));
        assert!(headers.iter().all(|h| !h.starts_with("X-Evil")));
        assert!(headers.contains(&"Subject: Hi  Bcc: everyone@example.com"));
    }

    #[test]
    fn test_compose_requires_sender() {
        let msg = Message::new("to@example.com", "S", "B");
        assert!(matches!(compose(&msg), Err(MailError::MissingSender)));
    }

    #[test]
    fn test_missing_program_is_local_error() {
        let transport = SendmailTransport::new(Path::new("/nonexistent/sendmail"));
        let msg = Message::new("to@example.com", "S", "B")
            .from(Mailbox::address("noreply@example.com"));

        let err = transport.deliver(&msg).unwrap_err();
        assert!(matches!(err, MailError::Local(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_deliver_through_program() {
        let transport = SendmailTransport::new(Path::new("true"));
        let msg = Message::new("to@example.com", "S", "B")
            .from(Mailbox::address("noreply@example.com"));
        transport.deliver(&msg).unwrap();

        let failing = SendmailTransport::new(Path::new("false"));
        assert!(matches!(failing.deliver(&msg), Err(MailError::Local(_))));
    }
}
