//! Plain DNS over UDP and TCP (RFC 1035 §4.2).
//!
//! Both variants open a fresh socket for every query and never fall back
//! to each other: a truncated UDP answer is still a decoded response.

use super::measure;
use crate::dns::message::{MessageBuilder, ResponseParser};
use crate::dns::transport::framing::{read_with_length_prefix, send_with_length_prefix};
use crate::dns::transport::{connect_tcp, io_to_domain, resolve_endpoint, unspecified_for};
use async_trait::async_trait;
use dnspulse_application::ports::{DnsResolver, QueryResult};
use dnspulse_domain::{DomainError, Protocol, ServerBinding};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct Do53UdpResolver {
    binding: ServerBinding,
    timeout: Duration,
}

impl Do53UdpResolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Self {
        Self { binding, timeout }
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let (id, query) = MessageBuilder::build_query_with_random_id(hostname, record_type)?;
        let server = resolve_endpoint(&self.binding).await?;

        let socket = UdpSocket::bind(unspecified_for(&server))
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to bind UDP socket: {}", e)))?;
        socket
            .connect(server)
            .await
            .map_err(|e| io_to_domain(e, server))?;

        let bytes_sent = socket
            .send(&query)
            .await
            .map_err(|e| io_to_domain(e, server))?;
        debug!(server = %server, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let received = socket
            .recv(&mut recv_buf)
            .await
            .map_err(|e| io_to_domain(e, server))?;
        debug!(server = %server, bytes_received = received, "UDP response received");

        ResponseParser::parse(&recv_buf[..received], Some(id))
    }
}

#[async_trait]
impl DnsResolver for Do53UdpResolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        measure(cancel, self.timeout, self.exchange(hostname, record_type)).await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Do53Udp
    }

    async fn close(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

pub struct Do53TcpResolver {
    binding: ServerBinding,
    timeout: Duration,
}

impl Do53TcpResolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Self {
        Self { binding, timeout }
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let (id, query) = MessageBuilder::build_query_with_random_id(hostname, record_type)?;
        let server = resolve_endpoint(&self.binding).await?;
        let label = server.to_string();

        let mut stream = connect_tcp(server).await?;
        send_with_length_prefix(&mut stream, &query).await?;
        debug!(server = %server, message_len = query.len(), "TCP query sent");

        let response = read_with_length_prefix(&mut stream, &label).await?;
        debug!(server = %server, response_len = response.len(), "TCP response received");

        ResponseParser::parse(&response, Some(id))
    }
}

#[async_trait]
impl DnsResolver for Do53TcpResolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        measure(cancel, self.timeout, self.exchange(hostname, record_type)).await
    }

    fn protocol(&self) -> Protocol {
        Protocol::Do53Tcp
    }

    async fn close(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
