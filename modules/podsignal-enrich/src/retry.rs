use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::warn;

use ai_client::AiError;
use apify_client::ApifyError;
use podsignal_common::RetryPolicy;

/// Run `op` until it succeeds, fails permanently, or attempts run out. Delay between
/// attempts is base * 3^attempt (capped) plus random jitter.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < attempts && is_transient(&err) => {
                let delay = policy.backoff(attempt) + jitter(policy.jitter_ms);
                warn!(
                    what,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn jitter(max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Network errors, 429, 5xx and timed-out runs. Errors we cannot classify are
/// treated as transient.
pub fn is_transient(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ApifyError>() {
            return e.is_transient();
        }
        if let Some(e) = cause.downcast_ref::<AiError>() {
            return e.is_transient();
        }
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            if let Some(status) = e.status() {
                return status.as_u16() == 429 || status.is_server_error();
            }
            return e.is_timeout() || e.is_connect() || e.is_request();
        }
    }
    true
}
