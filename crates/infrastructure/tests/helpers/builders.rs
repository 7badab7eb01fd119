#![allow(dead_code)]
use dnspulse_domain::{DnsServerConfig, Protocol, TlsConfig};
use std::net::SocketAddr;

pub struct ServerConfigBuilder;

impl ServerConfigBuilder {
    pub fn at(addr: SocketAddr, protocol: Protocol) -> DnsServerConfig {
        DnsServerConfig::new(addr.ip().to_string())
            .with_port(addr.port())
            .with_protocol(protocol.as_str())
    }

    pub fn insecure(addr: SocketAddr, protocol: Protocol) -> DnsServerConfig {
        Self::at(addr, protocol).with_tls(TlsConfig {
            server_name: Some("localhost".to_string()),
            insecure_skip_verify: true,
        })
    }

    /// Connects to `addr` but presents the test certificate's name, which
    /// does not resolve.
    pub fn pinned(addr: SocketAddr, protocol: Protocol) -> DnsServerConfig {
        Self::at(addr, protocol).with_tls(TlsConfig {
            server_name: Some(super::TEST_SERVER_NAME.to_string()),
            insecure_skip_verify: true,
        })
    }

    /// A loopback port with nothing listening on TCP.
    pub fn closed_tcp_port() -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }
}
