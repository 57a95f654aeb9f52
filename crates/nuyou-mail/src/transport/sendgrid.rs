//! Transactional email API transport.
//!
//! Posts a v3 `mail/send` JSON payload with bearer authentication. Any 2xx
//! status is success (the API normally answers 202 Accepted).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use super::Transport;
use crate::MailError;
use crate::message::Message;

/// Timeout for the whole request.
const TIMEOUT: Duration = Duration::from_secs(10);

/// API transport.
pub struct SendGridTransport {
    agent: Agent,
    api_key: String,
    url: String,
}

impl SendGridTransport {
    /// Create a transport posting to `url` with `api_key`.
    #[must_use]
    pub fn new(api_key: &str, url: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_key: api_key.to_owned(),
            url: url.to_owned(),
        }
    }
}

impl Transport for SendGridTransport {
    fn name(&self) -> &'static str {
        "SendGrid"
    }

    fn deliver(&self, message: &Message) -> Result<(), MailError> {
        let payload = serde_json::to_vec(&Payload::from_message(message)?)?;

        let response = self
            .agent
            .post(&self.url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(&payload[..])
            .map_err(|e| MailError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(());
        }

        let body = response.into_body().read_to_string().unwrap_or_default();
        Err(MailError::Api {
            status,
            detail: error_detail(&body),
        })
    }
}

/// First error message from an API error body, if any.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.errors.into_iter().next().map(|e| e.message)
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> Address<'a> {
    fn bare(email: &'a str) -> Self {
        Self { email, name: None }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

impl<'a> Payload<'a> {
    fn from_message(message: &'a Message) -> Result<Self, MailError> {
        let from = message.from.as_ref().ok_or(MailError::MissingSender)?;

        Ok(Self {
            personalizations: [Personalization {
                to: [Address::bare(&message.to)],
                bcc: message.bcc.iter().map(|b| Address::bare(b)).collect(),
            }],
            from: Address {
                email: &from.email,
                name: from.name.as_deref(),
            },
            reply_to: message.reply_to.as_deref().map(Address::bare),
            subject: &message.subject,
            content: [Content {
                kind: message.content_type(),
                value: &message.body,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Mailbox;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    fn message() -> Message {
        Message::new("to@example.com", "Subject", "Body")
            .from(Mailbox::new("noreply@example.com", "Site"))
            .reply_to("visitor@example.com")
            .bcc(["bcc@example.com"])
    }

    /// Serve one HTTP request with a canned response; returns the raw request.
    fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v3/mail/send", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            head + &String::from_utf8(request_body).unwrap()
        });

        (url, handle)
    }

    #[test]
    fn test_payload_shape() {
        let msg = message();
        let payload = serde_json::to_value(Payload::from_message(&msg).unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({
                "personalizations": [{
                    "to": [{"email": "to@example.com"}],
                    "bcc": [{"email": "bcc@example.com"}]
                }],
                "from": {"email": "noreply@example.com", "name": "Site"},
                "reply_to": {"email": "visitor@example.com"},
                "subject": "Subject",
                "content": [{"type": "text/plain", "value": "Body"}]
            })
        );
    }

    #[test]
    fn test_payload_omits_empty_optionals() {
        let msg = Message::new("to@example.com", "S", "<p>B</p>")
            .from(Mailbox::address("noreply@example.com"))
            .html();
        let payload = serde_json::to_value(Payload::from_message(&msg).unwrap()).unwrap();
        assert!(payload.get("reply_to").is_none());
        assert!(payload["personalizations"][0].get("bcc").is_none());
        assert!(payload["from"].get("name").is_none());
        assert_eq!(payload["content"][0]["type"], "text/html");
    }

    #[test]
    fn test_payload_requires_sender() {
        let msg = Message::new("to@example.com", "S", "B");
        assert!(matches!(
            Payload::from_message(&msg),
            Err(MailError::MissingSender)
        ));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"errors":[{"message":"bad key","field":null}]}"#),
            Some("bad key".to_owned())
        );
        assert_eq!(error_detail(r#"{"errors":[]}"#), None);
        assert_eq!(error_detail("<html>oops</html>"), None);
    }

    #[test]
    fn test_deliver_accepted() {
        let (url, server) = one_shot_server("HTTP/1.1 202 Accepted", "");
        let transport = SendGridTransport::new("SG.test-key", &url);

        transport.deliver(&message()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /v3/mail/send"));
        assert!(request.contains("Bearer SG.test-key"));
        assert!(request.contains(r#""subject":"Subject""#));
    }

    #[test]
    fn test_deliver_server_error() {
        let (url, server) = one_shot_server(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"errors":[{"message":"upstream exploded"}]}"#,
        );
        let transport = SendGridTransport::new("SG.test-key", &url);

        let err = transport.deliver(&message()).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, MailError::Api { status: 500, .. }));
        assert_eq!(
            err.to_string(),
            "SendGrid API error (HTTP 500): upstream exploded"
        );
    }

    #[test]
    fn test_deliver_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport =
            SendGridTransport::new("SG.test-key", &format!("http://127.0.0.1:{port}/send"));

        let err = transport.deliver(&message()).unwrap_err();
        assert!(matches!(err, MailError::Connection(_)));
        assert!(err.to_string().starts_with("SendGrid connection error"));
    }
}
