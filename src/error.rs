//! Error types for the relay.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bot(#[from] BotError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Configuration-related errors. Always fatal, and only at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Bot API transport errors (replies, file metadata, downloads).
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Telegram {method} request failed: {reason}")]
    Http { method: String, reason: String },

    #[error("Telegram {method} rejected: {description}")]
    Api { method: String, description: String },

    #[error("File {file_id} has no download path")]
    NoFilePath { file_id: String },
}

/// Mail dispatch errors (message construction, SMTP session).
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid {field} address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("Failed to build message: {reason}")]
    Build { reason: String },

    #[error("No destination address registered for {alias}")]
    NoDestination { alias: String },

    #[error("SMTP send failed: {reason}")]
    Send { reason: String },
}

/// Result type alias for the relay.
pub type Result<T> = std::result::Result<T, Error>;
