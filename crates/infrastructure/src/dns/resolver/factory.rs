use super::{
    Do53TcpResolver, Do53UdpResolver, Doh3Resolver, DohResolver, DoqResolver, DotResolver,
};
use dnspulse_application::ports::{DnsResolver, ResolverFactory};
use dnspulse_domain::{DnsServerConfig, DomainError, Protocol, ServerBinding};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maps a server entry's protocol tag to its transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransportResolverFactory;

impl TransportResolverFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ResolverFactory for TransportResolverFactory {
    fn build(
        &self,
        server: &DnsServerConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn DnsResolver>, DomainError> {
        let binding = ServerBinding::from_config(server)?;

        debug!(
            server = %binding.endpoint(),
            protocol = %binding.protocol,
            server_name = %binding.tls.server_name,
            timeout_ms = timeout.as_millis() as u64,
            "Building resolver"
        );

        if server.tls.is_some() && !binding.protocol.is_encrypted() {
            warn!(
                server = %binding.endpoint(),
                protocol = %binding.protocol,
                "TLS settings ignored for plaintext protocol"
            );
        }

        let resolver: Arc<dyn DnsResolver> = match binding.protocol {
            Protocol::Do53Udp => Arc::new(Do53UdpResolver::new(binding, timeout)),
            Protocol::Do53Tcp => Arc::new(Do53TcpResolver::new(binding, timeout)),
            Protocol::Dot => Arc::new(DotResolver::new(binding, timeout)?),
            Protocol::Doh => Arc::new(DohResolver::new(binding, timeout)?),
            Protocol::Doh3 => Arc::new(Doh3Resolver::new(binding, timeout)?),
            Protocol::Doq => Arc::new(DoqResolver::new(binding, timeout)?),
        };

        Ok(resolver)
    }
}
