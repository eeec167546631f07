use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;

use crate::providers::policy::preview;

/// Sends a request, retrying transport failures and 5xx answers a few times with short jittered
/// delays. This sits below the engine's own attempt loops and only smooths over blips inside
/// one logical provider call.
pub(crate) async fn send_with_retry<F>(
    provider: &'static str,
    retry_max_times: usize,
    build: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let policy = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_millis(300))
        .with_max_times(retry_max_times)
        .with_jitter();

    let build = &build;
    (|| async move {
        let resp = build().send().await?;

        if resp.status().is_server_error() {
            let status = resp.status();
            let url = resp.url().clone();
            let err = resp.error_for_status_ref().err();
            let Some(err) = err else {
                return Ok(resp);
            };

            let body_preview = match resp.bytes().await {
                Ok(bytes) => preview(&String::from_utf8_lossy(&bytes)),
                Err(e) => format!("<failed to read body: {e}>"),
            };

            tracing::debug!(
                provider,
                %status,
                url = %url,
                body = %body_preview,
                "[{provider}] Upstream server error (will retry)"
            );

            return Err(err);
        }

        Ok(resp)
    })
    .retry(policy)
    .await
}
