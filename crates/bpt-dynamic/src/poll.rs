//! Fixed-interval polling bounded by one deadline
//!
//! The check runs immediately, then every `interval` until it yields a value
//! or `deadline` has elapsed since the first attempt. The last sleep is
//! shortened so that a final check happens exactly at the deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Polling ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `check` until it returns `Some` or `deadline` elapses
///
/// # Errors
/// [`PollTimeout`] once the deadline has passed without a result.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    deadline: Duration,
    mut check: F,
) -> Result<T, PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let mut attempts = 0;
    loop {
        attempts += 1;
        if let Some(value) = check().await {
            tracing::debug!(attempts, elapsed = ?started.elapsed(), "poll satisfied");
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            return Err(PollTimeout { attempts, elapsed });
        }
        tokio::time::sleep(interval.min(deadline - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ready_after(ready_at: Duration) -> Result<Duration, PollTimeout> {
        let started = Instant::now();
        poll_until(Duration::from_millis(500), Duration::from_millis(5000), || async move {
            let elapsed = started.elapsed();
            (elapsed >= ready_at).then_some(elapsed)
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_result_needs_one_attempt() {
        let mut calls = 0;
        let value = poll_until(Duration::from_millis(500), Duration::from_millis(5000), || {
            calls += 1;
            async { Some(7) }
        })
        .await
        .unwrap();
        assert_eq!((value, calls), (7, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn condition_before_deadline_succeeds() {
        let seen_at = ready_after(Duration::from_millis(4800)).await.unwrap();
        assert_eq!(seen_at, Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn condition_after_deadline_times_out() {
        let timeout = ready_after(Duration::from_millis(5200)).await.unwrap_err();
        assert_eq!(timeout.elapsed, Duration::from_millis(5000));
        assert_eq!(timeout.attempts, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn last_sleep_is_clamped_to_deadline() {
        let started = Instant::now();
        let timeout = poll_until(Duration::from_millis(400), Duration::from_millis(1000), || async {
            None::<()>
        })
        .await
        .unwrap_err();
        assert_eq!(timeout.attempts, 4);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }
}
