use super::DnsResolver;
use dnspulse_domain::{DnsServerConfig, DomainError};
use std::sync::Arc;
use std::time::Duration;

/// Builds the resolver variant matching a server entry's protocol tag.
pub trait ResolverFactory: Send + Sync {
    fn build(
        &self,
        server: &DnsServerConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn DnsResolver>, DomainError>;
}
