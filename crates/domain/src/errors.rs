use thiserror::Error;

/// Failure of a single probe or of resolver construction.
///
/// Every transport error collapses into one of these variants before it
/// reaches the prober, so metric shape never depends on the transport.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Malformed response framing from {server}: {reason}")]
    MalformedFraming { server: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout after {timeout_ms} ms")]
    QueryTimeout { timeout_ms: u64 },

    #[error("Query cancelled")]
    QueryCancelled,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport connection refused by {server}: {reason}")]
    TransportConnectionRefused { server: String, reason: String },

    #[error("TLS handshake with {server} failed: {reason}")]
    TlsHandshakeFailed { server: String, reason: String },

    #[error("HTTP server {server} returned status {status}")]
    HttpStatus { server: String, status: u16 },

    #[error("Unsupported protocol: '{0}'")]
    UnsupportedProtocol(String),

    #[error("Resolver for {0} is closed")]
    ResolverClosed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
