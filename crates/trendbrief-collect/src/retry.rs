//! Retry with exponential back-off and jitter for collector HTTP calls.
//!
//! Only transient conditions are retried; parse failures and hard HTTP
//! statuses are returned immediately, since retrying cannot fix them.

use std::future::Future;
use std::time::Duration;

use crate::error::CollectError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// Retriable: rate limits (429), network-level failures, and 5xx responses.
/// Not retriable: other HTTP statuses, JSON/XML parse failures.
pub(crate) fn is_retriable(err: &CollectError) -> bool {
    match err {
        CollectError::RateLimited { .. } => true,
        CollectError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        CollectError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        CollectError::Deserialize { .. } | CollectError::Xml(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)`, capped at
/// 60 s, with ±25 % jitter so parallel collectors do not stampede an
/// upstream in lockstep.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CollectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient collector error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
