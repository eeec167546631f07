use crate::error::{AuthenticationError, BookingError};
use crate::utils::logging::with_pretty_json_debug;
use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Maps a structured upstream error body onto the authentication taxonomy.
pub trait MapAuthError: std::fmt::Debug + DeserializeOwned + Serialize {
    fn try_match_rule(&self, status: StatusCode) -> Option<AuthenticationError>;

    fn auth_error_from_status(status: StatusCode, body: &str) -> AuthenticationError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AuthenticationError::InvalidCredentials
            }
            StatusCode::LOCKED | StatusCode::TOO_MANY_REQUESTS => {
                AuthenticationError::TemporarilyBlocked(preview(body))
            }
            _ => AuthenticationError::Generic(format!("{status}: {}", preview(body))),
        }
    }
}

pub(crate) fn preview(body: &str) -> String {
    format!("{:.len$}", body, len = UPSTREAM_BODY_PREVIEW_CHARS)
}

/// Consumes a non-success login response and classifies it.
pub(crate) async fn classify_auth_error<E>(resp: reqwest::Response) -> AuthenticationError
where
    E: MapAuthError,
{
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    let raw_body = String::from_utf8_lossy(&bytes).into_owned();

    if let Ok(error) = serde_json::from_slice::<E>(&bytes) {
        if let Some(mapped) = error.try_match_rule(status) {
            with_pretty_json_debug(&error, |pretty_error| {
                tracing::debug!(
                    %status,
                    ?mapped,
                    body = %pretty_error,
                    "Upstream structured auth error matched mapping rule"
                );
            });
            return mapped;
        }
    }

    let mapped = E::auth_error_from_status(status, &raw_body);
    tracing::debug!(
        %status,
        ?mapped,
        body = %preview(&raw_body),
        "Upstream auth error fell back to status mapping"
    );
    mapped
}

/// Consumes a non-success booking/schedule response into a generic booking error.
pub(crate) async fn booking_error(resp: reqwest::Response) -> BookingError {
    let status = resp.status();
    let body = match resp.text().await {
        Ok(body) => preview(&body),
        Err(e) => format!("<failed to read body: {e}>"),
    };
    tracing::debug!(%status, body = %body, "Upstream booking error");
    BookingError::Generic(format!("upstream status {status}: {body}"))
}

/// Validation calls only distinguish "dead token" from "could not tell".
pub(crate) fn validation_error(status: StatusCode) -> AuthenticationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthenticationError::TokenInvalid,
        other => AuthenticationError::TokenValidationFailed(format!("upstream status {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize)]
    struct Plain {}

    impl MapAuthError for Plain {
        fn try_match_rule(&self, _status: StatusCode) -> Option<AuthenticationError> {
            None
        }
    }

    #[test]
    fn status_fallback_separates_lockouts_from_generic_failures() {
        assert_eq!(
            Plain::auth_error_from_status(StatusCode::UNAUTHORIZED, ""),
            AuthenticationError::InvalidCredentials
        );
        assert!(matches!(
            Plain::auth_error_from_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            AuthenticationError::TemporarilyBlocked(_)
        ));
        assert!(matches!(
            Plain::auth_error_from_status(StatusCode::BAD_GATEWAY, ""),
            AuthenticationError::Generic(_)
        ));
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(UPSTREAM_BODY_PREVIEW_CHARS * 2);
        assert_eq!(preview(&body).len(), UPSTREAM_BODY_PREVIEW_CHARS);
    }

    #[test]
    fn validation_errors_mark_rejected_tokens_invalid() {
        assert_eq!(
            validation_error(StatusCode::UNAUTHORIZED),
            AuthenticationError::TokenInvalid
        );
        assert!(matches!(
            validation_error(StatusCode::SERVICE_UNAVAILABLE),
            AuthenticationError::TokenValidationFailed(_)
        ));
    }
}
