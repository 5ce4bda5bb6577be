// Transport-level retry with exponential backoff
//
// Only the HTTP call is retried; a routing decision is never replayed.

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

const MAX_ATTEMPTS: u32 = 3;
const FIRST_DELAY: Duration = Duration::from_secs(1);

/// Run `f` up to three times, doubling the delay between attempts
pub async fn with_retry<F, Fut, T>(f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = FIRST_DELAY;

    for attempt in 1..MAX_ATTEMPTS {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                tracing::warn!(
                    "Request failed (attempt {attempt}/{MAX_ATTEMPTS}), retrying in {delay:?}: {e:#}"
                );
                sleep(delay).await;
                delay *= 2;
            }
        }
    }

    // Last attempt surfaces its error to the caller
    f().await
}
