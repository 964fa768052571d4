//! Inbound event router — the HTTP webhook endpoint.
//!
//! The platform POSTs updates to `/{token}`; the path segment doubles as a
//! shared secret. Document messages from authorized senders are handed to
//! the document handler; everything else is dropped without a reply.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::auth::AuthTable;
use crate::bot::types::Update;
use crate::handler::{DocumentEvent, DocumentHandler};

/// Shared state for the webhook route.
#[derive(Clone)]
pub struct WebhookState {
    /// Expected path secret — the bot token, per the platform convention.
    pub path_token: String,
    pub auth: Arc<AuthTable>,
    pub handler: Arc<DocumentHandler>,
}

/// Build the webhook router.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/{token}", post(receive_update))
        .with_state(state)
}

/// POST /{token} — one webhook update per request.
///
/// Always answers 200 for a well-formed update on the right path, whatever
/// the handler outcome, so the platform does not redeliver the event.
async fn receive_update(
    Path(token): Path<String>,
    State(state): State<WebhookState>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token != state.path_token {
        return StatusCode::NOT_FOUND;
    }

    let update_id = update.update_id;
    match document_event(update) {
        Some(event) if state.auth.is_authorized(&event.sender_alias) => {
            state.handler.handle(event).await;
        }
        Some(event) => {
            // Deliberately silent toward the sender.
            tracing::debug!(
                update_id,
                sender = %event.sender_alias,
                "Dropping document from unauthorized sender"
            );
        }
        None => {
            tracing::trace!(update_id, "Ignoring update without an actionable document");
        }
    }

    StatusCode::OK
}

/// Extract a document event from an update, if there is one.
///
/// Requires a message with a document and a sender username; a document
/// without a reported file name keeps the event (empty name) so the format
/// check can answer the sender.
pub fn document_event(update: Update) -> Option<DocumentEvent> {
    let message = update.message?;
    let document = message.document?;
    let sender_alias = message.from.and_then(|u| u.username)?;

    Some(DocumentEvent {
        sender_alias,
        file_name: document.file_name.unwrap_or_default(),
        file_id: document.file_id,
        chat_id: message.chat.id,
        message_id: message.message_id,
    })
}

// ── Tests ───────────────────────────────────────────────────────────
