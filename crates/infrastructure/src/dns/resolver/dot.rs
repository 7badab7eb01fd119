//! DNS-over-TLS (RFC 7858): TCP + TLS, length-prefixed messages, one
//! connection per query.

use super::measure;
use crate::dns::message::{MessageBuilder, ResponseParser};
use crate::dns::transport::framing::{read_with_length_prefix, send_with_length_prefix};
use crate::dns::transport::{connect_tcp, resolve_endpoint, tls};
use async_trait::async_trait;
use dnspulse_application::ports::{DnsResolver, QueryResult};
use dnspulse_domain::{DomainError, Protocol, ServerBinding};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_rustls::TlsConnector;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DotResolver {
    binding: ServerBinding,
    timeout: Duration,
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl DotResolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Result<Self, DomainError> {
        let config = tls::client_config(&binding.tls, &[])?;
        let server_name = tls::server_name(&binding.tls)?;

        Ok(Self {
            binding,
            timeout,
            connector: TlsConnector::from(Arc::new(config)),
            server_name,
        })
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let (id, query) = MessageBuilder::build_query_with_random_id(hostname, record_type)?;
        let server = resolve_endpoint(&self.binding).await?;
        let label = server.to_string();

        let tcp_stream = connect_tcp(server).await?;
        let mut stream = self
            .connector
            .connect(self.server_name.clone(), tcp_stream)
            .await
            .map_err(|e| DomainError::TlsHandshakeFailed {
                server: label.clone(),
                reason: e.to_string(),
            })?;
        debug!(server = %server, server_name = %self.binding.tls.server_name, "TLS connection established");

        send_with_length_prefix(&mut stream, &query).await?;
        let response = read_with_length_prefix(&mut stream, &label).await?;
        debug!(server = %server, response_len = response.len(), "TLS response received");

        // close_notify; the answer is already in hand
        let _ = stream.shutdown().await;

        ResponseParser::parse(&response, Some(id))
    }
}

#[async_trait]
impl DnsResolver for DotResolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        measure(cancel, self.timeout, self.exchange(hostname, record_type)).await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Dot
    }

    async fn close(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
