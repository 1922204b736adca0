//! Bounded fixed-delay retry for transient platform I/O

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::traits::PlatformResult;

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds, fails non-transiently, or attempts run out.
///
/// Only transient errors (network failures, 5xx responses) are retried;
/// anything else surfaces immediately.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> PlatformResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PlatformResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.attempts => {
                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempt, e, policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
