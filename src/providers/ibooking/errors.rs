use crate::error::AuthenticationError;
use crate::providers::MapAuthError;
use reqwest::StatusCode;
use slotbot_schema::IbookingLoginResponse;

impl MapAuthError for IbookingLoginResponse {
    fn try_match_rule(&self, status: StatusCode) -> Option<AuthenticationError> {
        match status {
            // Lockouts arrive as 400 with an explanatory error text.
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN if self.is_blocked() => Some(
                AuthenticationError::TemporarilyBlocked(self.error.clone().unwrap_or_default()),
            ),
            StatusCode::BAD_REQUEST if self.error.is_some() => {
                Some(AuthenticationError::InvalidCredentials)
            }
            _ => None,
        }
    }
}
