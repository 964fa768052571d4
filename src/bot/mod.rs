//! Bot API transport — outbound calls to the messaging platform.

pub mod api;
pub mod types;

pub use api::TelegramBot;

use async_trait::async_trait;

use crate::error::BotError;

/// Resolved file metadata, ready for download.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub file_path: String,
    pub file_size: Option<u64>,
}

/// The messaging-transport operations the relay depends on.
///
/// Implemented by [`TelegramBot`]; test doubles implement it in-process.
#[async_trait]
pub trait BotTransport: Send + Sync {
    /// Send a plain text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError>;

    /// Send a text message as a reply to a specific message.
    async fn reply_to(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), BotError>;

    /// Resolve a file identifier to a downloadable path.
    async fn get_file(&self, file_id: &str) -> Result<FileInfo, BotError>;

    /// Fetch the raw bytes behind a previously resolved file path.
    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, BotError>;
}
