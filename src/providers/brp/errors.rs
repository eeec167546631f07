use crate::error::AuthenticationError;
use crate::providers::MapAuthError;
use reqwest::StatusCode;
use slotbot_schema::BrpErrorBody;

impl MapAuthError for BrpErrorBody {
    fn try_match_rule(&self, status: StatusCode) -> Option<AuthenticationError> {
        if self.is_blocked() {
            return Some(AuthenticationError::TemporarilyBlocked(
                self.message.clone().unwrap_or_default(),
            ));
        }
        match (status, self.error_code.as_deref()) {
            (StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST, Some(code))
                if code.eq_ignore_ascii_case("INVALID_CREDENTIALS") =>
            {
                Some(AuthenticationError::InvalidCredentials)
            }
            _ => None,
        }
    }
}
