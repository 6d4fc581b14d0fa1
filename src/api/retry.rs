use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;

/// Delay to wait after the given number of failed attempts
#[derive(Clone)]
pub enum Backoff {
    None,
    /// `step * failed_attempts`
    Linear(Duration),
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Linear(step) => *step * failed_attempts,
            Backoff::Custom(f) => f(failed_attempts),
        }
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::None => f.write_str("None"),
            Backoff::Linear(step) => f.debug_tuple("Linear").field(step).finish(),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Bounded re-invocation of a failed remote call.
///
/// Every attempt counts toward `max_attempts`, including the first one.
/// Transport failures, timeouts and non-2xx answers are retried; errors
/// raised before anything reached the network (bad request, undecodable
/// body, local storage) are returned immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::Linear(Duration::from_secs(1)))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy that retries without sleeping, for tests and local tools
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::None)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Run `op` until it succeeds or the ceiling is reached. `op` receives
    /// the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    let delay = self.backoff.delay(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {} - retrying in {}ms",
                        label,
                        attempt,
                        self.max_attempts,
                        e,
                        delay.as_millis()
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("{} failed after {} attempt(s): {}", label, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

fn is_retryable(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::HttpError(_) | ApiError::Timeout(_) | ApiError::Backend { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ApiError {
        ApiError::Backend {
            status: 503,
            code: None,
            message: "Service Unavailable".to_string(),
        }
    }

    #[test]
    fn test_linear_backoff_grows() {
        let backoff = Backoff::Linear(Duration::from_millis(500));
        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(2), Duration::from_millis(1000));
        assert_eq!(Backoff::None.delay(5), Duration::ZERO);
    }

    #[test]
    fn test_custom_backoff() {
        let backoff = Backoff::Custom(Arc::new(|n| Duration::from_millis(10u64.pow(n))));
        assert_eq!(backoff.delay(2), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result = policy
            .run("flaky", |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 { Err(unavailable()) } else { Ok("rows") }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "rows");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_final_failure_surfaces() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<(), _> = policy
            .run("down", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert!(matches!(result, Err(ApiError::Backend { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let result: Result<(), _> = policy
            .run("bad body", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::ParseError("eof".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backoff_waits_between_attempts() {
        let policy = RetryPolicy::new(2, Backoff::Linear(Duration::from_millis(60)));
        let start = std::time::Instant::now();

        let _ = policy
            .run("slow", |attempt| async move {
                if attempt == 1 { Err(unavailable()) } else { Ok(()) }
            })
            .await;

        assert!(start.elapsed().as_millis() >= 50);
    }
}
