//! The six upstream transports behind the `DnsResolver` port.

mod do53;
mod doh;
mod doh3;
mod doq;
mod dot;
mod factory;

pub use do53::{Do53TcpResolver, Do53UdpResolver};
pub use doh::DohResolver;
pub use doh3::Doh3Resolver;
pub use doq::DoqResolver;
pub use dot::DotResolver;
pub use factory::TransportResolverFactory;

use dnspulse_application::ports::QueryResult;
use dnspulse_domain::DomainError;
use hickory_proto::op::Message;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs one exchange under the query timeout and the caller's cancellation,
/// timing it from start to completion or failure.
pub(crate) async fn measure<F>(
    cancel: &CancellationToken,
    timeout: Duration,
    exchange: F,
) -> QueryResult
where
    F: Future<Output = Result<Message, DomainError>>,
{
    let started = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::QueryCancelled),
        result = tokio::time::timeout(timeout, exchange) => match result {
            Ok(outcome) => outcome,
            Err(_) => Err(DomainError::QueryTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        },
    };

    let duration = started.elapsed();
    match outcome {
        Ok(response) => QueryResult::succeeded(response, duration),
        Err(error) => QueryResult::failed(error, duration),
    }
}
