//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the whole exchange (connect, send, response headers, body) by one deadline
//! - Cancel the in-flight operation cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future aborts the call
//! - The deadline is fixed when the request starts and carried into the
//!   response body, so a stalled body read fails at the same instant
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

use crate::error::ClientError;

/// Overall per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Dial timeout (name resolution and TCP connect).
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// TLS handshake timeout.
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Point in time by which a request, body included, must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Timer firing at the deadline.
    pub fn sleep(&self) -> Sleep {
        tokio::time::sleep_until(self.at)
    }

    /// Error reported when the deadline passes.
    pub fn error(&self) -> ClientError {
        ClientError::Timeout(self.budget)
    }

    /// Run `fut`, mapping expiry to [`ClientError::Timeout`].
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ClientError>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(self.error()),
        }
    }
}

/// Run `fut` under a fresh deadline of `budget`.
pub async fn with_deadline<F, T, E>(budget: Duration, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ClientError>,
{
    Deadline::after(budget).run(fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_maps_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ClientError>(())
        };
        let err = with_deadline(REQUEST_TIMEOUT, slow).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(d) if d == REQUEST_TIMEOUT));
    }

    #[tokio::test]
    async fn result_passes_through() {
        let value = with_deadline(REQUEST_TIMEOUT, async { Ok::<_, ClientError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_shared_across_phases() {
        let deadline = Deadline::after(Duration::from_secs(10));

        let first = async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok::<_, ClientError>(())
        };
        deadline.run(first).await.unwrap();
        assert!(!deadline.is_expired());

        // Six more seconds would fit a fresh budget but not what is left.
        let second = async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok::<_, ClientError>(())
        };
        let err = deadline.run(second).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_secs(10)));
        assert!(deadline.is_expired());
    }
}
