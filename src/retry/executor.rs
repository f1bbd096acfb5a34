//! Retry executor wrapping a fallible async operation.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::error::LoadError;
use crate::retry::RetryPolicy;

/// Hook invoked before each retry with the attempt number (starting at 1)
/// and the error that triggered it.
pub type RetryHook = Arc<dyn Fn(u32, &LoadError) + Send + Sync>;

/// Hook invoked exactly once when the final allowed attempt has failed.
pub type ExhaustedHook = Arc<dyn Fn(&LoadError) + Send + Sync>;

/// Retries a failing asynchronous operation with exponential backoff.
///
/// The operation is attempted once, then retried up to
/// [`RetryPolicy::max_retries`] times with a doubling delay between attempts.
/// After the final attempt fails the last error is returned to the caller;
/// the coordinator catches it at its own boundary and converts it into
/// section state.
pub struct RetryExecutor {
    policy: RetryPolicy,
    on_retry: Option<RetryHook>,
    on_max_retries: Option<ExhaustedHook>,
}

impl RetryExecutor {
    /// Creates a new executor with the given policy and no hooks.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            on_retry: None,
            on_max_retries: None,
        }
    }

    /// Sets the hook invoked before each retry.
    pub fn with_on_retry(mut self, hook: RetryHook) -> Self {
        self.on_retry = Some(hook);
        self
    }

    /// Sets the hook invoked once when all retries are exhausted.
    pub fn with_on_max_retries(mut self, hook: ExhaustedHook) -> Self {
        self.on_max_retries = Some(hook);
        self
    }

    /// Runs the operation to success or final failure.
    ///
    /// Returns the operation's value on the first success. On failure the
    /// hooks fire as described on [`RetryExecutor`] and the last error is
    /// returned. A `max_retries` of 0 means exactly one attempt.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, LoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LoadError>>,
    {
        let mut retries_made = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if retries_made >= self.policy.max_retries {
                        if let Some(ref hook) = self.on_max_retries {
                            hook(&err);
                        }
                        return Err(err);
                    }

                    retries_made += 1;
                    if let Some(ref hook) = self.on_retry {
                        hook(retries_made, &err);
                    }

                    let delay = self.policy.delay_for_attempt(retries_made);
                    debug!(
                        attempt = retries_made,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, backing off before retry"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
