//! Bounded retry with selectable backoff and credential-refresh hooks

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::config::AiConfig;
use crate::error::AiError;

/// Zero-arg credential refresh callback, invoked after a 401/403 failure.
/// Its own failure stops the retry loop.
pub type RefreshHook = Arc<dyn Fn() -> BoxFuture<'static, Result<(), AiError>> + Send + Sync>;

/// Retry policy applied around one fallible operation.
///
/// Built once at client-initialization time and shared by reference across
/// call sites. All mutable state lives inside a single `run` invocation, so
/// concurrent independent calls are safe.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Always at least 1.
    pub max_attempts: u32,
    /// Base wait between attempts.
    pub base_delay: Duration,
    /// Double the wait after every retry when set, fixed wait otherwise.
    pub exponential: bool,
    /// When set, a failure whose status code is absent from this set is
    /// surfaced immediately, attempts remaining or not.
    pub retryable_status_codes: Option<HashSet<u16>>,
    /// Surface 404 failures immediately.
    pub skip_not_found: bool,
    /// Invoked after every 401 failure, before the next attempt.
    pub on_unauthorized_refresh: Option<RefreshHook>,
    /// Invoked after every 403 failure, before the next attempt.
    pub on_forbidden_refresh: Option<RefreshHook>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            exponential: true,
            retryable_status_codes: None,
            skip_not_found: false,
            on_unauthorized_refresh: None,
            on_forbidden_refresh: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("exponential", &self.exponential)
            .field("retryable_status_codes", &self.retryable_status_codes)
            .field("skip_not_found", &self.skip_not_found)
            .field(
                "on_unauthorized_refresh",
                &self.on_unauthorized_refresh.is_some(),
            )
            .field("on_forbidden_refresh", &self.on_forbidden_refresh.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// Build a policy from the client configuration. Hooks start unset.
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            base_delay: config.retry_delay(),
            exponential: config.retry_exponential,
            retryable_status_codes: config.retry_only_on_status_codes.clone(),
            skip_not_found: config.skip_retry_on_not_found,
            on_unauthorized_refresh: None,
            on_forbidden_refresh: None,
        }
    }

    /// Install a refresh hook invoked after every 401 failure.
    pub fn with_unauthorized_refresh(mut self, hook: RefreshHook) -> Self {
        self.on_unauthorized_refresh = Some(hook);
        self
    }

    /// Install a refresh hook invoked after every 403 failure.
    pub fn with_forbidden_refresh(mut self, hook: RefreshHook) -> Self {
        self.on_forbidden_refresh = Some(hook);
        self
    }

    /// Wait before retry number `retry` (1-based).
    fn backoff_delay(&self, retry: u32) -> Duration {
        if self.exponential {
            let factor = 2u32.saturating_pow(retry.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        } else {
            self.base_delay
        }
    }

    /// Run `op` until it succeeds, a failure is classified as final, or all
    /// attempts are spent. The last failure always surfaces unchanged.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, AiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let code = err.status_code();

            // A retryable-set only constrains failures that carry a code.
            if let (Some(allowed), Some(code)) = (&self.retryable_status_codes, code) {
                if !allowed.contains(&code) {
                    return Err(err);
                }
            }

            if self.skip_not_found && code == Some(404) {
                return Err(err);
            }

            if code == Some(401) {
                if let Some(hook) = &self.on_unauthorized_refresh {
                    info!(attempt, "unauthorized response, refreshing credentials");
                    if let Err(refresh_err) = hook().await {
                        return Err(match refresh_err {
                            e @ AiError::AuthRefresh(_) => e,
                            other => AiError::AuthRefresh(other.to_string()),
                        });
                    }
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    attempt += 1;
                    continue;
                }
            } else if code == Some(403) {
                if let Some(hook) = &self.on_forbidden_refresh {
                    info!(attempt, "forbidden response, refreshing credentials");
                    if let Err(refresh_err) = hook().await {
                        return Err(match refresh_err {
                            e @ AiError::AuthRefresh(_) => e,
                            other => AiError::AuthRefresh(other.to_string()),
                        });
                    }
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    attempt += 1;
                    continue;
                }
            }

            if attempt >= max_attempts {
                return Err(err);
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::RwLock;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    fn status_err(code: u16) -> AiError {
        AiError::Status {
            code,
            body: format!("status {code}"),
        }
    }

    #[tokio::test]
    async fn test_always_failing_op_runs_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(4);

        let counted = Arc::clone(&calls);
        let result: Result<(), AiError> = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(status_err(500))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(result, Err(AiError::Status { code: 500, .. })));
    }

    #[tokio::test]
    async fn test_success_returns_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(5);

        let counted = Arc::clone(&calls);
        let result = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42u32)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_code_outside_retryable_set_stops_at_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            retryable_status_codes: Some(HashSet::from([500])),
            ..fast_policy(5)
        };

        let counted = Arc::clone(&calls);
        let result: Result<(), AiError> = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(status_err(404))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AiError::Status { code: 404, .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_ignores_retryable_set() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            retryable_status_codes: Some(HashSet::from([500])),
            ..fast_policy(2)
        };

        let counted = Arc::clone(&calls);
        let result: Result<(), AiError> = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(AiError::Transport("connection reset".to_string()))
                }
            })
            .await;

        // No status code on the failure, so the set does not suppress it.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(AiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_skip_not_found_stops_regardless_of_retryable_set() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            skip_not_found: true,
            retryable_status_codes: Some(HashSet::from([404, 500])),
            ..fast_policy(5)
        };

        let counted = Arc::clone(&calls);
        let result: Result<(), AiError> = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(status_err(404))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unauthorized_refresh_invoked_per_observed_401() {
        let calls = Arc::new(AtomicU32::new(0));
        let refreshes = Arc::new(AtomicU32::new(0));

        let refresh_counter = Arc::clone(&refreshes);
        let hook: RefreshHook = Arc::new(move || {
            let refreshes = Arc::clone(&refresh_counter);
            Box::pin(async move {
                refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        let policy = fast_policy(5).with_unauthorized_refresh(hook);

        // Fails with 401 twice, then succeeds on the third attempt.
        let counted = Arc::clone(&calls);
        let result = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n <= 2 {
                        Err(status_err(401))
                    } else {
                        Ok("fresh")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates_as_auth_refresh() {
        let hook: RefreshHook = Arc::new(|| {
            Box::pin(async { Err(AiError::Transport("token service down".to_string())) })
        });
        let policy = fast_policy(5).with_forbidden_refresh(hook);

        let result: Result<(), AiError> = policy.run(|| async { Err(status_err(403)) }).await;

        assert!(matches!(result, Err(AiError::AuthRefresh(_))));
    }

    #[tokio::test]
    async fn test_refreshed_credential_visible_to_next_attempt() {
        let credential = Arc::new(RwLock::new("stale".to_string()));

        let refreshed = Arc::clone(&credential);
        let hook: RefreshHook = Arc::new(move || {
            let credential = Arc::clone(&refreshed);
            Box::pin(async move {
                *credential.write().unwrap() = "fresh".to_string();
                Ok(())
            })
        });

        let policy = fast_policy(3).with_unauthorized_refresh(hook);

        let observed = Arc::clone(&credential);
        let result = policy
            .run(|| {
                let credential = Arc::clone(&observed);
                async move {
                    let token = credential.read().unwrap().clone();
                    if token == "stale" {
                        Err(status_err(401))
                    } else {
                        Ok(token)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_401_without_hook_follows_backoff_path() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(3);

        let counted = Arc::clone(&calls);
        let result: Result<(), AiError> = policy
            .run(|| {
                let calls = Arc::clone(&counted);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(status_err(401))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_exponential_backoff_doubles_per_retry() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            exponential: true,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_fixed_backoff_is_constant() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(250),
            exponential: false,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.backoff_delay(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(250));
    }

    #[test]
    fn test_from_config_clamps_zero_attempts() {
        let config = AiConfig {
            retry_attempts: 0,
            ..AiConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 1);
    }
}
