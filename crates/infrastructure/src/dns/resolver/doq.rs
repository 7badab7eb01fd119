//! DNS-over-QUIC (RFC 9250).
//!
//! Every query dials a new connection on the resolver's endpoint, opens one
//! bidirectional stream, writes a length-prefixed message, half-closes the
//! send side and reads one length-prefixed response.

use super::measure;
use crate::dns::message::{MessageBuilder, ResponseParser, ZERO_MESSAGE_ID};
use crate::dns::transport::framing::{read_with_length_prefix, send_with_length_prefix};
use crate::dns::transport::quic::{self, EndpointSlot, NO_ERROR};
use crate::dns::transport::{resolve_endpoint, tls};
use async_trait::async_trait;
use dnspulse_application::ports::{DnsResolver, QueryResult};
use dnspulse_domain::{DomainError, Protocol, ServerBinding};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DoqResolver {
    binding: ServerBinding,
    timeout: Duration,
    client_config: quinn::ClientConfig,
    endpoint: Mutex<EndpointSlot>,
}

impl DoqResolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Result<Self, DomainError> {
        let client_config = quic::client_config(&binding.tls, tls::ALPN_DOQ)?;

        Ok(Self {
            binding,
            timeout,
            client_config,
            endpoint: Mutex::new(EndpointSlot::default()),
        })
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let query = MessageBuilder::build_query(hostname, record_type, ZERO_MESSAGE_ID)?;
        let server = resolve_endpoint(&self.binding).await?;
        let label = server.to_string();

        let endpoint = {
            let mut slot = self.endpoint.lock().await;
            if slot.is_closed() {
                return Err(DomainError::ResolverClosed(self.binding.endpoint()));
            }
            slot.get_or_bind(server, &self.client_config)?
        };

        let conn = quic::connect(&endpoint, server, &self.binding.tls.server_name).await?;
        let result = Self::query_stream(&conn, &query, &label).await;
        conn.close(NO_ERROR, b"");
        result
    }

    async fn query_stream(
        conn: &quinn::Connection,
        query: &[u8],
        label: &str,
    ) -> Result<Message, DomainError> {
        let (mut send_stream, mut recv_stream) = conn.open_bi().await.map_err(|e| {
            DomainError::IoError(format!("Failed to open QUIC stream to {}: {}", label, e))
        })?;

        send_with_length_prefix(&mut send_stream, query).await?;
        send_stream.finish().map_err(|e| {
            DomainError::IoError(format!(
                "Failed to finish QUIC send stream to {}: {}",
                label, e
            ))
        })?;
        debug!(server = %label, message_len = query.len(), "DoQ query sent");

        let response = read_with_length_prefix(&mut recv_stream, label).await?;
        debug!(server = %label, response_len = response.len(), "DoQ response received");

        ResponseParser::parse(&response, None)
    }
}

#[async_trait]
impl DnsResolver for DoqResolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        measure(cancel, self.timeout, self.exchange(hostname, record_type)).await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Doq
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.endpoint.lock().await.close();
        Ok(())
    }
}
