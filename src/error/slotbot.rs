use super::{AuthenticationError, BookingError};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SlotbotError {
    #[error(transparent)]
    Auth(#[from] AuthenticationError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("No credentials stored for user {user_id} on chain {chain}")]
    MissingCredentials { user_id: i64, chain: String },

    #[error("Unknown recurring booking: {0}")]
    UnknownBooking(i64),

    #[error("Crontab error: {0}")]
    Crontab(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<figment::Error> for SlotbotError {
    fn from(e: figment::Error) -> Self {
        SlotbotError::Config(e.to_string())
    }
}
