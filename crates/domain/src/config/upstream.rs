use serde::{Deserialize, Serialize};

/// Optional TLS overrides for encrypted transports.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TlsConfig {
    #[serde(default)]
    pub server_name: Option<String>,

    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// One `[[dns_servers]]` entry as written by the operator.
///
/// Port and protocol stay optional here; defaults are applied when the
/// entry is turned into a `ServerBinding`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DnsServerConfig {
    pub address: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Option<String>,

    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl DnsServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
            protocol: None,
            tls: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}
