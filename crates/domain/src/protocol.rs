use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire-level transport a probe is sent over.
///
/// The string form is used verbatim as the `protocol` metric label, so it
/// must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    #[default]
    Do53Udp,
    Do53Tcp,
    Dot,
    Doh,
    Doh3,
    Doq,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::Do53Udp,
        Protocol::Do53Tcp,
        Protocol::Dot,
        Protocol::Doh,
        Protocol::Doh3,
        Protocol::Doq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Do53Udp => "do53-udp",
            Self::Do53Tcp => "do53-tcp",
            Self::Dot => "dot",
            Self::Doh => "doh",
            Self::Doh3 => "doh3",
            Self::Doq => "doq",
        }
    }

    /// Standard port assumed when the configuration leaves it unset.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Do53Udp | Self::Do53Tcp => 53,
            Self::Dot | Self::Doq => 853,
            Self::Doh | Self::Doh3 => 443,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        !matches!(self, Self::Do53Udp | Self::Do53Tcp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::UnsupportedProtocol(s.to_string()))
    }
}

impl TryFrom<String> for Protocol {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}
