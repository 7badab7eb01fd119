//! DNS-over-HTTPS (RFC 8484) over HTTP/2.
//!
//! Queries are POSTed as `application/dns-message` to
//! `https://<server_name>:<port>/dns-query`. The request URL carries the TLS
//! server name, while a pinned resolver sends the connection to the
//! configured address, so SNI and `:authority` match the certificate even
//! when the upstream is configured by IP.

use super::measure;
use crate::dns::message::{MessageBuilder, ResponseParser, ZERO_MESSAGE_ID};
use crate::dns::transport::{resolve_endpoint, tls};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dnspulse_application::ports::{DnsResolver, QueryResult};
use dnspulse_domain::{DomainError, Protocol, ServerBinding};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Expected content type for DNS-over-HTTPS (RFC 8484 §4.2.1)
pub(crate) const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

pub(crate) fn dns_query_url(binding: &ServerBinding) -> String {
    format!(
        "https://{}:{}/dns-query",
        ServerBinding::host_for_uri(&binding.tls.server_name),
        binding.port
    )
}

/// Resolves every host name to the configured upstream address.
struct PinnedResolver {
    binding: ServerBinding,
}

impl Resolve for PinnedResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let binding = self.binding.clone();
        Box::pin(async move {
            let addr = resolve_endpoint(&binding)
                .await
                .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok(addrs)
        })
    }
}

pub struct DohResolver {
    binding: ServerBinding,
    timeout: Duration,
    url: String,
    client: ArcSwapOption<reqwest::Client>,
}

impl DohResolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Result<Self, DomainError> {
        let tls_config = tls::client_config(&binding.tls, &[tls::ALPN_H2])?;

        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls_config)
            .http2_prior_knowledge()
            .dns_resolver(Arc::new(PinnedResolver {
                binding: binding.clone(),
            }))
            .connect_timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| {
                DomainError::ConfigError(format!(
                    "Failed to build DoH client for {}: {}",
                    binding.endpoint(),
                    e
                ))
            })?;

        Ok(Self {
            url: dns_query_url(&binding),
            binding,
            timeout,
            client: ArcSwapOption::from_pointee(client),
        })
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let client = self
            .client
            .load_full()
            .ok_or_else(|| DomainError::ResolverClosed(self.binding.endpoint()))?;
        let query = MessageBuilder::build_query(hostname, record_type, ZERO_MESSAGE_ID)?;

        debug!(url = %self.url, message_len = query.len(), "Sending DoH query");

        let response = client
            .post(&self.url)
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .body(query)
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::HttpStatus {
                server: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.request_error(&e))?;
        debug!(url = %self.url, response_len = body.len(), "DoH response received");

        ResponseParser::parse(&body, None)
    }

    fn request_error(&self, error: &reqwest::Error) -> DomainError {
        let reason = error_chain(error);
        if error.is_timeout() {
            DomainError::TransportTimeout {
                server: self.url.clone(),
            }
        } else if error.is_connect() {
            DomainError::TransportConnectionRefused {
                server: self.url.clone(),
                reason,
            }
        } else {
            DomainError::IoError(format!("DoH request to {} failed: {}", self.url, reason))
        }
    }
}

fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl DnsResolver for DohResolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        measure(cancel, self.timeout, self.exchange(hostname, record_type)).await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Doh
    }

    async fn close(&self) -> Result<(), DomainError> {
        if self.client.swap(None).is_some() {
            debug!(url = %self.url, "DoH connection pool released");
        }
        Ok(())
    }
}
