use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::{FetchError, NetworkError, RetryOptions};

/// Message marker that makes an otherwise unclassified failure retryable.
pub const UNKNOWN_ERROR_MARKER: &str = "unknown_error";

/// What [`retry`] needs to know about a failure to decide whether to try again.
pub trait RetryableFailure {
    /// HTTP status carried by the failure, if any.
    fn status(&self) -> Option<u16> {
        None
    }

    fn message(&self) -> Cow<'_, str>;

    /// Server errors (status >= 500) and failures whose message mentions
    /// [`UNKNOWN_ERROR_MARKER`] are worth another attempt.
    fn is_retry_eligible(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
            || self.message().contains(UNKNOWN_ERROR_MARKER)
    }
}

impl RetryableFailure for NetworkError {
    fn status(&self) -> Option<u16> {
        Some(NetworkError::status(self).as_u16())
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(NetworkError::message(self))
    }
}

impl RetryableFailure for reqwest::Error {
    fn status(&self) -> Option<u16> {
        reqwest::Error::status(self).map(|status| status.as_u16())
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl RetryableFailure for FetchError {
    fn status(&self) -> Option<u16> {
        FetchError::status(self).map(|status| status.as_u16())
    }

    fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Network(err) => RetryableFailure::message(err),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl RetryableFailure for str {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RetryableFailure for String {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl RetryableFailure for Box<dyn StdError + Send + Sync> {
    fn status(&self) -> Option<u16> {
        boxed_status(&**self)
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl RetryableFailure for Box<dyn StdError> {
    fn status(&self) -> Option<u16> {
        boxed_status(&**self)
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// Recovers the HTTP status of a type-erased error raised by this crate or by
/// `reqwest`.
fn boxed_status(err: &(dyn StdError + 'static)) -> Option<u16> {
    if let Some(err) = err.downcast_ref::<FetchError>() {
        return RetryableFailure::status(err);
    }
    if let Some(err) = err.downcast_ref::<NetworkError>() {
        return RetryableFailure::status(err);
    }
    err.downcast_ref::<reqwest::Error>()
        .and_then(RetryableFailure::status)
}

impl<T: RetryableFailure + ?Sized> RetryableFailure for &T {
    fn status(&self) -> Option<u16> {
        (**self).status()
    }

    fn message(&self) -> Cow<'_, str> {
        (**self).message()
    }
}

/// Why [`retry_with_report`] stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GiveUp {
    /// The last allowed attempt failed.
    Exhausted,
    /// The failure was not retry-eligible.
    NotRetryable,
}

/// Last failure of [`retry_with_report`] together with how it got there.
#[derive(Debug)]
pub struct RetryError<E> {
    pub error: E,
    /// Number of times the operation was invoked.
    pub attempts: usize,
    pub reason: GiveUp,
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.attempts == 1 { "attempt" } else { "attempts" };
        write!(f, "gave up after {} {noun}: {}", self.attempts, self.error)
    }
}

impl<E: StdError + 'static> StdError for RetryError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

/// Pause after attempt `attempt` (1-indexed): `backoff_ms * attempt`.
pub fn backoff_delay(backoff_ms: u64, attempt: usize) -> Duration {
    let attempt = u64::try_from(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(backoff_ms.saturating_mul(attempt))
}

/// Invokes `op` until it succeeds, up to `options.attempts` times.
///
/// Only retry-eligible failures are retried, after waiting
/// `backoff_ms * attempt`. The failure that ends the loop is returned as-is.
///
/// ```no_run
/// use admin_fetch::{fetch_with_error, retry, RetryOptions};
///
/// # async fn run() -> admin_fetch::Result<()> {
/// let response = retry(
///     || fetch_with_error("http://localhost:8080/admin/realms", None),
///     RetryOptions::default(),
/// )
/// .await?;
/// # let _ = response;
/// # Ok(())
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(op: F, options: RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableFailure,
{
    retry_with_report(op, options)
        .await
        .map_err(RetryError::into_inner)
}

/// [`retry`] with three attempts and a 200 ms backoff unit.
pub async fn retry_default<T, E, F, Fut>(op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableFailure,
{
    retry(op, RetryOptions::default()).await
}

/// Same loop as [`retry`], but reports how many attempts were made and
/// whether it stopped on exhaustion or on a non-retryable failure.
pub async fn retry_with_report<T, E, F, Fut>(
    mut op: F,
    options: RetryOptions,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableFailure,
{
    let attempts = options.attempts.max(1);
    let mut attempt = 1usize;

    loop {
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        // The final attempt ends the loop without looking at the failure.
        if attempt >= attempts {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempt, "giving up, attempts exhausted: {}", error.message());

            return Err(RetryError {
                error,
                attempts: attempt,
                reason: GiveUp::Exhausted,
            });
        }

        if !error.is_retry_eligible() {
            #[cfg(feature = "tracing")]
            tracing::warn!(attempt, "giving up, failure not retryable: {}", error.message());

            return Err(RetryError {
                error,
                attempts: attempt,
                reason: GiveUp::NotRetryable,
            });
        }

        wait_before_retry(options.backoff_ms, attempt).await;
        attempt += 1;
    }
}

async fn wait_before_retry(backoff_ms: u64, attempt: usize) {
    let delay = backoff_delay(backoff_ms, attempt);

    #[cfg(feature = "tracing")]
    tracing::debug!(attempt, "retrying after {} ms", delay.as_millis());

    sleep(delay).await;
}
