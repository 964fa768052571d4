//! Mail dispatcher — builds the MIME message and submits it over SMTPS.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::MailError;

/// Fixed subject line on every relayed message.
const MAIL_SUBJECT: &str = "Send to Kindle";

/// Fallback attachment name when sanitization leaves nothing usable.
const FALLBACK_FILE_NAME: &str = "attachment.epub";

/// SMTP session settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

/// The mail-dispatch operation the handler depends on.
#[async_trait]
pub trait MailDispatch: Send + Sync {
    /// Send `file_bytes` as an attachment named `file_name` to `destination`.
    async fn send(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        destination: &str,
    ) -> Result<(), MailError>;
}

/// SMTPS dispatcher backed by lettre. One session per send; the session is
/// dropped (and the connection closed) on every exit path.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailDispatch for SmtpMailer {
    async fn send(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        destination: &str,
    ) -> Result<(), MailError> {
        let message = build_message(&self.config.username, destination, file_name, file_bytes)?;

        // lettre's sync transport blocks on the TLS handshake and submission.
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || submit(&config, &message))
            .await
            .map_err(|e| MailError::Send {
                reason: format!("mail task aborted: {e}"),
            })?
    }
}

/// Build the multipart message with the file as a base64 binary attachment.
fn build_message(
    from: &str,
    to: &str,
    file_name: &str,
    file_bytes: Vec<u8>,
) -> Result<Message, MailError> {
    let from: Mailbox = from.parse().map_err(|e| MailError::InvalidAddress {
        field: "from",
        reason: format!("{e}"),
    })?;
    let to: Mailbox = to.parse().map_err(|e| MailError::InvalidAddress {
        field: "to",
        reason: format!("{e}"),
    })?;

    let content_type =
        ContentType::parse("application/octet-stream").map_err(|e| MailError::Build {
            reason: e.to_string(),
        })?;
    let attachment =
        Attachment::new(sanitize_file_name(file_name)).body(file_bytes, content_type);

    Message::builder()
        .from(from)
        .to(to)
        .subject(MAIL_SUBJECT)
        .multipart(MultiPart::mixed().singlepart(attachment))
        .map_err(|e| MailError::Build {
            reason: e.to_string(),
        })
}

/// Open the SMTPS session, authenticate, submit, and let the transport drop.
fn submit(config: &SmtpConfig, message: &Message) -> Result<(), MailError> {
    let credentials = Credentials::new(
        config.username.clone(),
        config.password.expose_secret().to_string(),
    );

    // relay() is implicit TLS on connect (SMTPS), not STARTTLS.
    let transport = SmtpTransport::relay(&config.host)
        .map_err(|e| MailError::Send {
            reason: e.to_string(),
        })?
        .port(config.port)
        .credentials(credentials)
        .authentication(vec![Mechanism::Login])
        .build();

    let result = transport
        .send(message)
        .map(|_| ())
        .map_err(|e| MailError::Send {
            reason: e.to_string(),
        });

    tracing::debug!(host = %config.host, ok = result.is_ok(), "SMTP session closed");
    result
}

/// Strip characters that could smuggle extra headers through the
/// `Content-Disposition` filename parameter.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !c.is_control() && *c != '"').collect();
    if cleaned.trim().is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

// ── Tests ───────────────────────────────────────────────────────────
