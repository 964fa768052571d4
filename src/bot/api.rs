//! Telegram Bot API client over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::bot::types::{ApiResponse, BotIdentity, File};
use crate::bot::{BotTransport, FileInfo};
use crate::error::BotError;

/// Default timeout for Bot API round-trips, downloads included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot API client. Cheap to clone; the inner `reqwest::Client` is pooled.
#[derive(Clone)]
pub struct TelegramBot {
    token: SecretString,
    client: reqwest::Client,
}

impl TelegramBot {
    pub fn new(token: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { token, client }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{method}",
            self.token.expose_secret()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.token.expose_secret()
        )
    }

    /// POST a method call and unwrap the `{ok, result, description}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, BotError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Http {
                method: method.into(),
                reason: e.to_string(),
            })?;

        let envelope: ApiResponse<T> = resp.json().await.map_err(|e| BotError::Http {
            method: method.into(),
            reason: e.to_string(),
        })?;

        if !envelope.ok {
            return Err(BotError::Api {
                method: method.into(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            });
        }
        envelope.result.ok_or_else(|| BotError::Api {
            method: method.into(),
            description: "response missing result".into(),
        })
    }

    // ── Startup operations ──────────────────────────────────────────

    /// Verify the token by asking the API who we are.
    pub async fn get_me(&self) -> Result<BotIdentity, BotError> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Drop any previously registered webhook.
    pub async fn delete_webhook(&self) -> Result<(), BotError> {
        let _: bool = self.call("deleteWebhook", serde_json::json!({})).await?;
        Ok(())
    }

    /// Register the public webhook URL with the platform.
    pub async fn set_webhook(&self, url: &str) -> Result<(), BotError> {
        let _: bool = self
            .call("setWebhook", serde_json::json!({"url": url}))
            .await?;
        Ok(())
    }
}

/// Convert the wire `File` into resolved metadata; files past the platform's
/// size limit come back without a path.
fn into_file_info(file: File) -> Result<FileInfo, BotError> {
    match file.file_path {
        Some(file_path) => Ok(FileInfo {
            file_path,
            file_size: file.file_size,
        }),
        None => Err(BotError::NoFilePath {
            file_id: file.file_id,
        }),
    }
}

// ── BotTransport implementation ─────────────────────────────────────

#[async_trait]
impl BotTransport for TelegramBot {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                serde_json::json!({"chat_id": chat_id, "text": text}),
            )
            .await?;
        Ok(())
    }

    async fn reply_to(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), BotError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                serde_json::json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_to_message_id": message_id,
                    "allow_sending_without_reply": true,
                }),
            )
            .await?;
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<FileInfo, BotError> {
        let file: File = self
            .call("getFile", serde_json::json!({"file_id": file_id}))
            .await?;
        into_file_info(file)
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, BotError> {
        let resp = self
            .client
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| BotError::Http {
                method: "download".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(BotError::Api {
                method: "download".into(),
                description: format!("file endpoint returned {}", resp.status()),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| BotError::Http {
            method: "download".into(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> TelegramBot {
        TelegramBot::new(SecretString::from("123:ABC"))
    }

    #[test]
    fn api_url_embeds_token_and_method() {
        assert_eq!(
            bot().api_url("getFile"),
            "https://api.telegram.org/bot123:ABC/getFile"
        );
    }

    #[test]
    fn file_url_embeds_token_and_path() {
        assert_eq!(
            bot().file_url("documents/file_7.epub"),
            "https://api.telegram.org/file/bot123:ABC/documents/file_7.epub"
        );
    }

    #[test]
    fn file_with_path_resolves() {
        let info = into_file_info(File {
            file_id: "F1".into(),
            file_path: Some("documents/file_7.epub".into()),
            file_size: Some(2048),
        })
        .unwrap();
        assert_eq!(info.file_path, "documents/file_7.epub");
        assert_eq!(info.file_size, Some(2048));
    }

    #[test]
    fn file_without_path_is_an_error() {
        let err = into_file_info(File {
            file_id: "F1".into(),
            file_path: None,
            file_size: None,
        })
        .unwrap_err();
        assert!(matches!(err, BotError::NoFilePath { .. }));
        assert!(err.to_string().contains("F1"));
    }

    #[tokio::test]
    async fn send_message_surfaces_network_failure() {
        // No server behind this token's URL in tests; expect a transport error.
        let bot = TelegramBot::new(SecretString::from("invalid"));
        let err = bot.send_message(1, "hola").await.unwrap_err();
        assert!(matches!(err, BotError::Http { .. } | BotError::Api { .. }));
    }
}
