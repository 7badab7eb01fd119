use serde::{Deserialize, Serialize};

/// A domain under test and how many probes each server gets per cycle.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DomainTarget {
    pub name: String,

    #[serde(default = "default_probes")]
    pub probes: u32,
}

impl DomainTarget {
    pub fn new(name: impl Into<String>, probes: u32) -> Self {
        Self {
            name: name.into(),
            probes,
        }
    }
}

fn default_probes() -> u32 {
    1
}
