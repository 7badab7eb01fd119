//! Cache-busting query labels.
//!
//! Each probe is prefixed with a fresh random label so recursive resolvers
//! cannot answer it from cache. Five random bytes encode to exactly eight
//! base-32 characters, which keeps the query name (and thus the answer)
//! small enough for a single UDP datagram.

use ring::rand::{SecureRandom, SystemRandom};
use tracing::warn;

/// Random bytes drawn per label.
pub const LABEL_ENTROPY_BYTES: usize = 5;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Used only if the system RNG fails.
const FALLBACK_LABEL: &str = "random";

pub struct ProbeLabelGenerator {
    rng: SystemRandom,
}

impl ProbeLabelGenerator {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    pub fn label(&self) -> String {
        let mut bytes = [0u8; LABEL_ENTROPY_BYTES];
        match self.rng.fill(&mut bytes) {
            Ok(()) => encode_base32(&bytes),
            Err(_) => {
                warn!("System RNG failed, using fixed probe label");
                FALLBACK_LABEL.to_string()
            }
        }
    }

    /// `<label>.<domain>`
    pub fn probe_name(&self, domain: &str) -> String {
        format!("{}.{}", self.label(), domain.trim_start_matches('.'))
    }
}

impl Default for ProbeLabelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 4648 base-32, standard alphabet, no padding.
pub fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }

    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}
