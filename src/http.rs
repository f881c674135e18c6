//! JSON-over-HTTP with retry, shared by the model providers.
//!
//! Retry strategy:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::debug;

/// Build a client with the given request timeout.
pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Whether a non-success status is worth retrying.
pub fn is_retryable(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

/// POST `body` to `url` and return the parsed JSON response.
///
/// `service` names the remote side in error messages (e.g. `"OpenAI"`).
pub async fn post_json(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
    max_retries: u32,
    service: &str,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = backoff(attempt);
            debug!(service, attempt, ?delay, "retrying request");
            tokio::time::sleep(delay).await;
        }

        let mut request = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                let body_text = response.text().await.unwrap_or_default();
                if is_retryable(status) {
                    last_err = Some(anyhow::anyhow!(
                        "{} API error {}: {}",
                        service,
                        status,
                        body_text
                    ));
                    continue;
                }

                bail!("{} API error {}: {}", service, status, body_text);
            }
            Err(e) => {
                last_err = Some(anyhow::anyhow!(
                    "{} connection error ({}): {}",
                    service,
                    url,
                    e
                ));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", service)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
        assert_eq!(backoff(4), Duration::from_secs(8));
        assert_eq!(backoff(6), Duration::from_secs(32));
        assert_eq!(backoff(12), Duration::from_secs(32));
    }

    #[test]
    fn test_retryable_statuses() {
        use reqwest::StatusCode;
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }
}
