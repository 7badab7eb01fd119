//! QUIC client endpoints for DoQ and DoH3.

use super::{tls, unspecified_for};
use dnspulse_domain::{DomainError, TlsParams};
use quinn::crypto::rustls::QuicClientConfig;
use quinn::{ClientConfig, Connection, Endpoint, VarInt};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// RFC 9250 DOQ_NO_ERROR; also a clean HTTP/3 shutdown.
pub const NO_ERROR: VarInt = VarInt::from_u32(0);

pub fn client_config(tls: &TlsParams, alpn: &[u8]) -> Result<ClientConfig, DomainError> {
    let tls_config = tls::client_config(tls, &[alpn])?;
    let quic_config = QuicClientConfig::try_from(Arc::new(tls_config)).map_err(|e| {
        DomainError::ConfigError(format!(
            "Invalid QUIC TLS settings for {}: {}",
            tls.server_name, e
        ))
    })?;
    Ok(ClientConfig::new(Arc::new(quic_config)))
}

/// A lazily bound client endpoint owned by one resolver.
///
/// The endpoint is (re)bound to match the address family of the server and
/// is shut down for good by `close`.
#[derive(Default)]
pub struct EndpointSlot {
    endpoint: Option<Endpoint>,
    closed: bool,
}

impl EndpointSlot {
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_or_bind(
        &mut self,
        server: SocketAddr,
        config: &ClientConfig,
    ) -> Result<Endpoint, DomainError> {
        if let Some(endpoint) = &self.endpoint {
            let same_family = endpoint
                .local_addr()
                .map(|local| local.is_ipv4() == server.is_ipv4())
                .unwrap_or(false);
            if same_family {
                return Ok(endpoint.clone());
            }
        }

        let mut endpoint = Endpoint::client(unspecified_for(&server)).map_err(|e| {
            DomainError::IoError(format!("Failed to bind QUIC client endpoint: {}", e))
        })?;
        endpoint.set_default_client_config(config.clone());

        if let Some(previous) = self.endpoint.replace(endpoint.clone()) {
            previous.close(NO_ERROR, b"");
        }
        Ok(endpoint)
    }

    pub fn close(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            endpoint.close(NO_ERROR, b"");
            debug!("QUIC endpoint closed");
        }
        self.closed = true;
    }
}

/// Connects and completes the QUIC/TLS handshake.
pub async fn connect(
    endpoint: &Endpoint,
    server: SocketAddr,
    server_name: &str,
) -> Result<Connection, DomainError> {
    let host = server_name.trim_start_matches('[').trim_end_matches(']');
    let connecting = endpoint.connect(server, host).map_err(|e| {
        DomainError::TransportConnectionRefused {
            server: server.to_string(),
            reason: e.to_string(),
        }
    })?;

    let connection = connecting.await.map_err(|e| match e {
        quinn::ConnectionError::TimedOut => DomainError::TransportTimeout {
            server: server.to_string(),
        },
        quinn::ConnectionError::TransportError(transport) => DomainError::TlsHandshakeFailed {
            server: server.to_string(),
            reason: transport.to_string(),
        },
        other => DomainError::TransportConnectionRefused {
            server: server.to_string(),
            reason: other.to_string(),
        },
    })?;

    debug!(server = %server, server_name = %host, "QUIC connection established");
    Ok(connection)
}
