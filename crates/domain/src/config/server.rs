use serde::{Deserialize, Serialize};

/// Where the scrape endpoint listens.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl ServerConfig {
    /// `*` and the empty string both mean every interface.
    pub fn bind_address(&self) -> String {
        let host = match self.listen_address.as_str() {
            "" | "*" => "0.0.0.0",
            other => other,
        };
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.listen_port)
        } else {
            format!("{}:{}", host, self.listen_port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    9953
}
