use crate::config::DnsServerConfig;
use crate::{DomainError, Protocol};
use std::fmt;

/// Identity of a configured upstream; one resolver exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    pub address: String,
    pub port: u16,
    pub protocol: Protocol,
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.port, self.protocol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsParams {
    /// SNI and certificate name; also the HTTP authority for DoH/DoH3.
    pub server_name: String,
    pub insecure_skip_verify: bool,
}

/// Resolved, immutable description of one upstream server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerBinding {
    pub address: String,
    pub port: u16,
    pub protocol: Protocol,
    pub tls: TlsParams,
}

impl ServerBinding {
    /// Applies protocol defaults to a raw server entry.
    ///
    /// An absent protocol means `do53-udp`; a present but empty or unknown
    /// tag is rejected.
    pub fn from_config(server: &DnsServerConfig) -> Result<Self, DomainError> {
        let protocol = match server.protocol.as_deref() {
            None => Protocol::default(),
            Some(tag) => tag.parse()?,
        };

        let port = server.port.unwrap_or_else(|| protocol.default_port());

        let (server_name, insecure_skip_verify) = match &server.tls {
            Some(tls) => (
                tls.server_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&server.address)
                    .to_string(),
                tls.insecure_skip_verify,
            ),
            None => (server.address.clone(), false),
        };

        Ok(Self {
            address: server.address.clone(),
            port,
            protocol,
            tls: TlsParams {
                server_name,
                insecure_skip_verify,
            },
        })
    }

    pub fn key(&self) -> ServerKey {
        ServerKey {
            address: self.address.clone(),
            port: self.port,
            protocol: self.protocol,
        }
    }

    /// `address:port`, as used for the `server` metric label.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Host part suitable for a URL or socket lookup (IPv6 literals bracketed).
    pub fn host_for_uri(host: &str) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host.to_string()
        }
    }
}
