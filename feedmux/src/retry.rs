use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tokio::time::sleep;

/// Default [`RetryPolicy`] used when opening the underlying connection.
pub const CONNECT_RETRY_POLICY: RetryPolicy = RetryPolicy {
    backoff_ms_initial: 125,
    backoff_multiplier: 2,
    backoff_ms_max: 60000,
    max_retries: 3,
};

/// Configuration for exponential backoff retry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Initial backoff in milliseconds.
    pub backoff_ms_initial: u64,
    /// Multiplier applied to the backoff after each failed attempt.
    pub backoff_multiplier: u8,
    /// Maximum backoff in milliseconds.
    pub backoff_ms_max: u64,
    /// Maximum number of retry attempts.
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Backoff slept before each retry, in order. Yields `max_retries` delays, each capped at
    /// `backoff_ms_max`.
    pub fn backoffs(&self) -> impl Iterator<Item = Duration> + use<> {
        let Self {
            backoff_ms_initial,
            backoff_multiplier,
            backoff_ms_max,
            max_retries,
        } = *self;

        std::iter::successors(Some(backoff_ms_initial.min(backoff_ms_max)), move |backoff_ms| {
            Some(
                backoff_ms
                    .saturating_mul(u64::from(backoff_multiplier))
                    .min(backoff_ms_max),
            )
        })
        .take(max_retries as usize)
        .map(Duration::from_millis)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        CONNECT_RETRY_POLICY
    }
}

/// Execute a future-producing closure with exponential backoff retry.
///
/// The `should_retry` closure determines whether a given error is retriable, sleeping for the
/// next [`RetryPolicy::backoffs`] delay before trying again. Returns the first success, the
/// first non-retriable error, or the last error once every retry is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    for backoff in policy.backoffs() {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if should_retry(&err) => sleep(backoff).await,
            Err(err) => return Err(err),
        }
    }

    // Final attempt after all retries.
    operation().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedmux_integration::error::SocketError;
    use std::{
        io,
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
    };
    use tokio_tungstenite::tungstenite;

    fn refused() -> SocketError {
        SocketError::from(tungstenite::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        )))
    }

    #[test]
    fn test_backoffs() {
        struct TestCase {
            input: RetryPolicy,
            expected: Vec<u64>,
        }

        let cases = vec![
            TestCase {
                // TC0: default connect policy doubles from 125ms
                input: RetryPolicy::default(),
                expected: vec![125, 250, 500],
            },
            TestCase {
                // TC1: backoff is capped at backoff_ms_max
                input: RetryPolicy {
                    backoff_ms_initial: 1000,
                    backoff_multiplier: 4,
                    backoff_ms_max: 5000,
                    max_retries: 4,
                },
                expected: vec![1000, 4000, 5000, 5000],
            },
            TestCase {
                // TC2: initial backoff above the cap is capped
                input: RetryPolicy {
                    backoff_ms_initial: 90000,
                    backoff_multiplier: 2,
                    backoff_ms_max: 60000,
                    max_retries: 2,
                },
                expected: vec![60000, 60000],
            },
            TestCase {
                // TC3: multiplier of 1 keeps a constant backoff
                input: RetryPolicy {
                    backoff_ms_initial: 10,
                    backoff_multiplier: 1,
                    backoff_ms_max: 100,
                    max_retries: 3,
                },
                expected: vec![10, 10, 10],
            },
            TestCase {
                // TC4: zero retries has no backoff
                input: RetryPolicy {
                    max_retries: 0,
                    ..RetryPolicy::default()
                },
                expected: vec![],
            },
            TestCase {
                // TC5: huge multiplier saturates rather than overflowing
                input: RetryPolicy {
                    backoff_ms_initial: u64::MAX / 2,
                    backoff_multiplier: u8::MAX,
                    backoff_ms_max: u64::MAX,
                    max_retries: 2,
                },
                expected: vec![u64::MAX / 2, u64::MAX],
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let actual = test
                .input
                .backoffs()
                .map(|backoff| backoff.as_millis() as u64)
                .collect::<Vec<_>>();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[tokio::test]
    async fn test_connect_retries_refused_until_success() {
        let policy = RetryPolicy {
            backoff_ms_initial: 1,
            backoff_multiplier: 2,
            backoff_ms_max: 2,
            max_retries: 3,
        };
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = retry_with_backoff(&policy, SocketError::is_retriable, move || {
            let attempt = attempts_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(refused())
                } else {
                    Ok("connected")
                }
            }
        })
        .await;

        assert!(matches!(result, Ok("connected")));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_connect_gives_up_after_max_retries() {
        let policy = RetryPolicy {
            backoff_ms_initial: 1,
            backoff_multiplier: 2,
            backoff_ms_max: 2,
            max_retries: 2,
        };
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), SocketError> =
            retry_with_backoff(&policy, SocketError::is_retriable, move || {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(refused()) }
            })
            .await;

        assert!(matches!(result, Err(SocketError::WebSocket(_))));
        // max_retries (2) + 1 final attempt
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_connect_does_not_retry_invalid_url() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), SocketError> =
            retry_with_backoff(&RetryPolicy::default(), SocketError::is_retriable, move || {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(SocketError::UrlParse(url::ParseError::EmptyHost)) }
            })
            .await;

        assert!(matches!(result, Err(SocketError::UrlParse(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
