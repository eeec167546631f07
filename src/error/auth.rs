use super::IsRetryable;
use thiserror::Error as ThisError;

/// Failure of a credential exchange or of validating a cached handle.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum AuthenticationError {
    #[error("authentication failed: {0}")]
    Generic(String),

    #[error("could not extract token from login response: {0}")]
    TokenExtractionFailed(String),

    #[error("could not validate token: {0}")]
    TokenValidationFailed(String),

    #[error("token is no longer valid")]
    TokenInvalid,

    #[error("account is temporarily blocked: {0}")]
    TemporarilyBlocked(String),

    #[error("invalid credentials")]
    InvalidCredentials,
}

impl IsRetryable for AuthenticationError {
    fn is_retryable(&self) -> bool {
        // Retrying these only extends a lockout.
        !matches!(
            self,
            AuthenticationError::InvalidCredentials | AuthenticationError::TemporarilyBlocked(_)
        )
    }
}

impl From<reqwest::Error> for AuthenticationError {
    fn from(e: reqwest::Error) -> Self {
        AuthenticationError::Generic(e.to_string())
    }
}
