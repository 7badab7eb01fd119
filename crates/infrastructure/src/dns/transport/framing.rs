//! Two-byte big-endian length prefix framing (RFC 1035 §4.2.2, RFC 7858,
//! RFC 9250 §4.2). Used by do53-tcp, DoT and DoQ.

use dnspulse_domain::DomainError;
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        DomainError::InvalidDomainName(format!(
            "DNS message too large to frame: {} bytes",
            message_bytes.len()
        ))
    })?;

    let mut frame = Vec::with_capacity(message_bytes.len() + 2);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(message_bytes);

    stream
        .write_all(&frame)
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::IoError(format!("Failed to flush stream: {}", e)))?;

    Ok(())
}

/// Reads one length-prefixed message: the prefix, then exactly that many bytes.
pub async fn read_with_length_prefix<S>(stream: &mut S, server: &str) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| read_error(e, server, "length prefix"))?;

    let response_len = u16::from_be_bytes(len_buf) as usize;
    if response_len == 0 {
        return Err(DomainError::MalformedFraming {
            server: server.to_string(),
            reason: "zero-length message".to_string(),
        });
    }

    let mut response = vec![0u8; response_len];
    stream
        .read_exact(&mut response)
        .await
        .map_err(|e| read_error(e, server, "message body"))?;

    Ok(response)
}

fn read_error(error: std::io::Error, server: &str, part: &str) -> DomainError {
    if error.kind() == ErrorKind::UnexpectedEof {
        DomainError::MalformedFraming {
            server: server.to_string(),
            reason: format!("stream ended inside {}", part),
        }
    } else {
        DomainError::IoError(format!("Failed to read {} from {}: {}", part, server, error))
    }
}
