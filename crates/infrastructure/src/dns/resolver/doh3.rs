//! DNS-over-HTTPS over HTTP/3 (RFC 8484 + RFC 9114).
//!
//! One HTTP/3 connection is cached per resolver. Any failed exchange drops
//! it; the next probe reconnects and the failed probe is not retried.

use super::doh::{dns_query_url, DNS_MESSAGE_CONTENT_TYPE};
use super::measure;
use crate::dns::message::{MessageBuilder, ResponseParser, ZERO_MESSAGE_ID};
use crate::dns::transport::quic::{self, EndpointSlot};
use crate::dns::transport::{resolve_endpoint, tls};
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use dnspulse_application::ports::{DnsResolver, QueryResult};
use dnspulse_domain::{DomainError, Protocol, ServerBinding};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::Method;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type H3SendRequest = h3::client::SendRequest<h3_quinn::OpenStreams, Bytes>;

#[derive(Default)]
struct H3State {
    endpoint: EndpointSlot,
    connection: Option<H3SendRequest>,
}

pub struct Doh3Resolver {
    binding: ServerBinding,
    timeout: Duration,
    url: String,
    client_config: quinn::ClientConfig,
    state: Mutex<H3State>,
}

impl Doh3Resolver {
    pub fn new(binding: ServerBinding, timeout: Duration) -> Result<Self, DomainError> {
        let client_config = quic::client_config(&binding.tls, tls::ALPN_H3)?;

        Ok(Self {
            url: dns_query_url(&binding),
            binding,
            timeout,
            client_config,
            state: Mutex::new(H3State::default()),
        })
    }

    async fn get_or_connect(&self) -> Result<H3SendRequest, DomainError> {
        let mut state = self.state.lock().await;
        if state.endpoint.is_closed() {
            return Err(DomainError::ResolverClosed(self.binding.endpoint()));
        }
        if let Some(send_request) = &state.connection {
            return Ok(send_request.clone());
        }

        let server = resolve_endpoint(&self.binding).await?;
        let endpoint = state.endpoint.get_or_bind(server, &self.client_config)?;
        let quinn_conn = quic::connect(&endpoint, server, &self.binding.tls.server_name).await?;

        let (mut driver, send_request) = h3::client::new(h3_quinn::Connection::new(quinn_conn))
            .await
            .map_err(|e| DomainError::TransportConnectionRefused {
                server: server.to_string(),
                reason: format!("HTTP/3 setup failed: {}", e),
            })?;

        tokio::spawn(async move {
            let _ = std::future::poll_fn(|cx| driver.poll_close(cx)).await;
        });

        debug!(url = %self.url, server = %server, "HTTP/3 connection established");
        state.connection = Some(send_request.clone());
        Ok(send_request)
    }

    async fn drop_connection(&self) {
        if self.state.lock().await.connection.take().is_some() {
            debug!(url = %self.url, "Dropping cached HTTP/3 connection");
        }
    }

    async fn exchange(
        &self,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Message, DomainError> {
        let query = MessageBuilder::build_query(hostname, record_type, ZERO_MESSAGE_ID)?;
        let mut send_request = self.get_or_connect().await?;
        let body = self.execute_request(&mut send_request, query).await?;
        ResponseParser::parse(&body, None)
    }

    async fn execute_request(
        &self,
        send_request: &mut H3SendRequest,
        query: Vec<u8>,
    ) -> Result<Bytes, DomainError> {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri(self.url.as_str())
            .header(CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE)
            .header(ACCEPT, DNS_MESSAGE_CONTENT_TYPE)
            .body(())
            .map_err(|e| DomainError::IoError(format!("Failed to build H3 request: {}", e)))?;

        let mut stream = send_request
            .send_request(request)
            .await
            .map_err(|e| self.stream_error("send request", e))?;
        stream
            .send_data(Bytes::from(query))
            .await
            .map_err(|e| self.stream_error("send body", e))?;
        stream
            .finish()
            .await
            .map_err(|e| self.stream_error("finish stream", e))?;

        let response = stream
            .recv_response()
            .await
            .map_err(|e| self.stream_error("receive response", e))?;
        if !response.status().is_success() {
            return Err(DomainError::HttpStatus {
                server: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let mut body = BytesMut::new();
        while let Some(mut chunk) = stream
            .recv_data()
            .await
            .map_err(|e| self.stream_error("read body", e))?
        {
            body.extend_from_slice(chunk.chunk());
            chunk.advance(chunk.remaining());
        }

        debug!(url = %self.url, response_len = body.len(), "DoH3 response received");
        Ok(body.freeze())
    }

    fn stream_error(&self, step: &str, error: impl std::fmt::Display) -> DomainError {
        DomainError::IoError(format!("H3 {} to {} failed: {}", step, self.url, error))
    }
}

#[async_trait]
impl DnsResolver for Doh3Resolver {
    async fn query(
        &self,
        cancel: &CancellationToken,
        hostname: &str,
        record_type: RecordType,
    ) -> QueryResult {
        let result = measure(cancel, self.timeout, self.exchange(hostname, record_type)).await;
        if !result.is_success() {
            self.drop_connection().await;
        }
        result
    }

    fn protocol(&self) -> Protocol {
        Protocol::Doh3
    }

    async fn close(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        state.connection = None;
        state.endpoint.close();
        Ok(())
    }
}
