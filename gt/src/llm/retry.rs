//! Shared HTTP send loop with bounded retries

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use super::LlmError;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Longest wait between two attempts
const MAX_BACKOFF_MS: u64 = 30_000;

/// Fallback wait when a 429 carries no `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Send the request built by `build`, retrying transient failures
///
/// Errors for which [`LlmError::is_retryable`] holds (network failures,
/// 408 and 5xx responses) are retried up to `max_retries` times with
/// exponential backoff. A 429 is returned immediately as
/// [`LlmError::RateLimited`]. Any other non-success status is an
/// [`LlmError::ApiError`].
pub async fn send_with_retries<F>(build: F, max_retries: u32) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = None;
    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = backoff_delay(attempt);
            warn!(
                attempt,
                max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = ?last_error,
                "Retrying LLM request after transient error"
            );
            tokio::time::sleep(backoff).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(attempt, error = %e, "send_with_retries: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        let status = response.status().as_u16();

        if status == 429 {
            debug!("send_with_retries: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if response.status().is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let err = LlmError::ApiError { status, message: text };
        if err.is_retryable() && attempt < max_retries {
            debug!(attempt, status, "send_with_retries: retryable error");
            last_error = Some(err);
            continue;
        }

        debug!(%status, "send_with_retries: API error");
        return Err(err);
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}

/// Delay before retry number `attempt` (1-based), doubling up to a cap
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_capped_for_large_attempts() {
        assert_eq!(backoff_delay(6), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }
}
