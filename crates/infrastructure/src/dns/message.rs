//! DNS Message Builder / Parser
//!
//! Probe queries are single-question recursive queries built with
//! `hickory-proto`. Responses are checked against the wire header before
//! they are decoded, so a stray or mismatched datagram fails the probe
//! instead of being counted as an answer.

use dnspulse_domain::DomainError;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

const HEADER_LEN: usize = 12;
const QR_BIT: u8 = 0x80;

/// Message ID required by DoH (RFC 8484 §4.1) and DoQ (RFC 9250 §4.2.1).
pub const ZERO_MESSAGE_ID: u16 = 0;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Serializes a recursive query for `domain` with the given message ID.
    pub fn build_query(
        domain: &str,
        record_type: RecordType,
        id: u16,
    ) -> Result<Vec<u8>, DomainError> {
        let name = Self::fqdn(domain)?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.metadata.recursion_desired = true;
        message.add_query(query);

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDomainName(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }

    /// Query with a fresh random ID; returns the ID for response matching.
    pub fn build_query_with_random_id(
        domain: &str,
        record_type: RecordType,
    ) -> Result<(u16, Vec<u8>), DomainError> {
        let id = fastrand::u16(..);
        let bytes = Self::build_query(domain, record_type, id)?;
        Ok((id, bytes))
    }

    fn fqdn(domain: &str) -> Result<Name, DomainError> {
        let trimmed = domain.trim();
        if trimmed.is_empty() || trimmed == "." {
            return Err(DomainError::InvalidDomainName(
                "Query name cannot be empty".to_string(),
            ));
        }

        let absolute = if trimmed.ends_with('.') {
            trimmed.to_string()
        } else {
            format!("{}.", trimmed)
        };

        Name::from_str(&absolute).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })
    }
}

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes a response, optionally requiring it to echo `expected_id`.
    pub fn parse(response_bytes: &[u8], expected_id: Option<u16>) -> Result<Message, DomainError> {
        if response_bytes.len() < HEADER_LEN {
            return Err(DomainError::InvalidDnsResponse(format!(
                "Response too short: {} bytes",
                response_bytes.len()
            )));
        }

        if response_bytes[2] & QR_BIT == 0 {
            return Err(DomainError::InvalidDnsResponse(
                "Message is a query, not a response".to_string(),
            ));
        }

        if let Some(expected) = expected_id {
            let id = u16::from_be_bytes([response_bytes[0], response_bytes[1]]);
            if id != expected {
                return Err(DomainError::InvalidDnsResponse(format!(
                    "Response ID {} does not match query ID {}",
                    id, expected
                )));
            }
        }

        Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })
    }
}
