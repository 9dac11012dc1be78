use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram is not configured")]
    TelegramNotConfigured,

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
