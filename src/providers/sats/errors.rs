use crate::error::AuthenticationError;
use crate::providers::MapAuthError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// `{"code":"ACCOUNT_LOCKED","message":"..."}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SatsErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MapAuthError for SatsErrorBody {
    fn try_match_rule(&self, _status: StatusCode) -> Option<AuthenticationError> {
        match self.code.as_deref()? {
            "ACCOUNT_LOCKED" | "TOO_MANY_ATTEMPTS" => Some(AuthenticationError::TemporarilyBlocked(
                self.message.clone().unwrap_or_default(),
            )),
            "INVALID_CREDENTIALS" | "UNKNOWN_MEMBER" => Some(AuthenticationError::InvalidCredentials),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_lock_codes_are_blocks() {
        let body: SatsErrorBody =
            serde_json::from_str(r#"{"code":"TOO_MANY_ATTEMPTS"}"#).expect("parse sample");
        assert!(matches!(
            body.try_match_rule(StatusCode::BAD_REQUEST),
            Some(AuthenticationError::TemporarilyBlocked(_))
        ));
    }

    #[test]
    fn missing_code_falls_back_to_status() {
        let body: SatsErrorBody = serde_json::from_str(r#"{"message":"nope"}"#).expect("parse sample");
        assert_eq!(body.try_match_rule(StatusCode::UNAUTHORIZED), None);
        assert_eq!(
            SatsErrorBody::auth_error_from_status(StatusCode::UNAUTHORIZED, "nope"),
            AuthenticationError::InvalidCredentials
        );
    }
}
