//! Connection plumbing shared by the resolver variants.

pub mod framing;
pub mod quic;
pub mod tls;

use dnspulse_domain::{DomainError, ServerBinding};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::TcpStream;
use tracing::debug;

/// Resolves the configured address (IP literal or host name) to a socket address.
pub async fn resolve_endpoint(binding: &ServerBinding) -> Result<SocketAddr, DomainError> {
    let host = binding
        .address
        .trim_start_matches('[')
        .trim_end_matches(']');

    let mut addrs = tokio::net::lookup_host((host, binding.port))
        .await
        .map_err(|e| {
            DomainError::IoError(format!(
                "Failed to resolve server address {}: {}",
                binding.endpoint(),
                e
            ))
        })?;

    addrs.next().ok_or_else(|| {
        DomainError::IoError(format!("No address found for {}", binding.endpoint()))
    })
}

/// Wildcard local address of the same family as `server`.
pub fn unspecified_for(server: &SocketAddr) -> SocketAddr {
    if server.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    }
}

pub async fn connect_tcp(server: SocketAddr) -> Result<TcpStream, DomainError> {
    let stream = TcpStream::connect(server)
        .await
        .map_err(|e| io_to_domain(e, server))?;

    stream.set_nodelay(true).map_err(|e| {
        DomainError::IoError(format!("Failed to set TCP_NODELAY on {}: {}", server, e))
    })?;

    debug!(server = %server, "TCP connection established");
    Ok(stream)
}

/// Maps socket errors, keeping refused connections distinguishable.
pub fn io_to_domain(error: std::io::Error, server: SocketAddr) -> DomainError {
    match error.kind() {
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset => {
            DomainError::TransportConnectionRefused {
                server: server.to_string(),
                reason: error.to_string(),
            }
        }
        ErrorKind::TimedOut => DomainError::TransportTimeout {
            server: server.to_string(),
        },
        _ => DomainError::IoError(format!("{}: {}", server, error)),
    }
}
