use async_trait::async_trait;
use dnspulse_domain::{DomainError, Protocol};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of exactly one resolution attempt.
///
/// A decoded response is present if and only if there is no error; the
/// elapsed time is always recorded, including time-to-failure.
#[derive(Debug, Clone)]
pub struct QueryResult {
    outcome: Result<Message, DomainError>,
    duration: Duration,
}

impl QueryResult {
    pub fn succeeded(response: Message, duration: Duration) -> Self {
        Self {
            outcome: Ok(response),
            duration,
        }
    }

    pub fn failed(error: DomainError, duration: Duration) -> Self {
        Self {
            outcome: Err(error),
            duration,
        }
    }

    pub fn response(&self) -> Option<&Message> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DomainError> {
        self.outcome.as_ref().err()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// One upstream server reached over one transport.
///
/// Implementations own their transport state exclusively. `query` never
/// retries and never falls back to another transport; every failure is
/// reported inside the returned `QueryResult`.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult;

    /// Stable metric label; never depends on query outcomes.
    fn protocol(&self) -> Protocol;

    /// Releases pooled connections and endpoints. Safe to call repeatedly.
    async fn close(&self) -> Result<(), DomainError>;
}
