//! Bounded readiness polling.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::domain::InterceptorError;

/// Poll `probe` until it returns `true`.
///
/// Makes at most `max_attempts` probes, sleeping `interval` between two
/// probes (never after the last one). A probe error counts as "not ready"
/// and is kept to be reported if every attempt fails.
///
/// # Errors
///
/// Returns [`InterceptorError::ReadinessTimeout`] naming `target` when the
/// attempt budget runs out.
pub async fn wait_until<F, Fut>(
    target: &str,
    interval: Duration,
    max_attempts: u32,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(true) => return Ok(()),
            Ok(false) => debug!(subject = target, attempt, "not ready yet"),
            Err(e) => {
                debug!(subject = target, attempt, error = %e, "readiness probe failed");
                last_error = Some(format!("{e:#}"));
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(InterceptorError::ReadinessTimeout {
        target: target.to_string(),
        attempts: max_attempts,
        last_error,
    }
    .into())
}
