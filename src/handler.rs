//! Document handler — the per-event relay flow.
//!
//! Format check → download → receipt ack → destination lookup → mail
//! dispatch → exactly one final reply. Every failure is contained to the
//! event that raised it.

use std::sync::Arc;

use crate::auth::AuthTable;
use crate::bot::BotTransport;
use crate::error::{Error, MailError};
use crate::mailer::MailDispatch;

/// Accepted file suffix, matched case-sensitively.
const ACCEPTED_SUFFIX: &str = ".epub";

pub const REPLY_REJECTED: &str = "Solo se aceptan archivos .epub.";
pub const REPLY_SENT: &str = "✅ Archivo enviado por correo correctamente.";

/// One document-bearing webhook event. Owned by the handler invocation
/// processing it; discarded when the handler returns.
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub sender_alias: String,
    pub file_name: String,
    pub file_id: String,
    pub chat_id: i64,
    pub message_id: i64,
}

pub struct DocumentHandler {
    bot: Arc<dyn BotTransport>,
    mailer: Arc<dyn MailDispatch>,
    auth: Arc<AuthTable>,
}

impl DocumentHandler {
    pub fn new(
        bot: Arc<dyn BotTransport>,
        mailer: Arc<dyn MailDispatch>,
        auth: Arc<AuthTable>,
    ) -> Self {
        Self { bot, mailer, auth }
    }

    /// Process one event. Never returns an error: outcomes are reported to
    /// the sender, and reply failures only get logged.
    pub async fn handle(&self, event: DocumentEvent) {
        if !event.file_name.ends_with(ACCEPTED_SUFFIX) {
            tracing::info!(
                sender = %event.sender_alias,
                file = %event.file_name,
                "Rejecting unsupported file type"
            );
            self.reply(&event, REPLY_REJECTED).await;
            return;
        }

        match self.relay(&event).await {
            Ok(()) => {
                tracing::info!(
                    sender = %event.sender_alias,
                    file = %event.file_name,
                    "Document relayed"
                );
                self.send(&event, REPLY_SENT).await;
            }
            Err(e) => {
                tracing::error!(
                    sender = %event.sender_alias,
                    file = %event.file_name,
                    error = %e,
                    "Relay failed"
                );
                self.send(&event, &format!("❌ Error al enviar correo: {e}"))
                    .await;
            }
        }
    }

    /// Download, acknowledge, resolve, dispatch.
    async fn relay(&self, event: &DocumentEvent) -> Result<(), Error> {
        let info = self.bot.get_file(&event.file_id).await?;
        tracing::debug!(
            file = %event.file_name,
            path = %info.file_path,
            size = ?info.file_size,
            "Downloading document"
        );
        let bytes = self.bot.download_file(&info.file_path).await?;

        // Optimistic receipt ack, sent before the mail round-trip completes.
        self.reply(
            event,
            &format!(
                "Archivo recibido: {}. Enviando por correo...",
                event.file_name
            ),
        )
        .await;

        // The router already gated on authorization, but the table is not
        // trusted to still hold the alias here.
        let destination =
            self.auth
                .resolve(&event.sender_alias)
                .ok_or_else(|| MailError::NoDestination {
                    alias: event.sender_alias.clone(),
                })?;

        self.mailer
            .send(bytes, &event.file_name, destination)
            .await?;
        Ok(())
    }

    async fn reply(&self, event: &DocumentEvent, text: &str) {
        if let Err(e) = self
            .bot
            .reply_to(event.chat_id, event.message_id, text)
            .await
        {
            tracing::warn!(chat = event.chat_id, error = %e, "Failed to send reply");
        }
    }

    async fn send(&self, event: &DocumentEvent, text: &str) {
        if let Err(e) = self.bot.send_message(event.chat_id, text).await {
            tracing::warn!(chat = event.chat_id, error = %e, "Failed to send message");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
