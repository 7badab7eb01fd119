pub mod errors;
pub mod logging;
pub mod probe;
pub mod root;
pub mod server;
pub mod upstream;

pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use probe::DomainTarget;
pub use root::{CliOverrides, Config, DEFAULT_PROBE_INTERVAL_SECS, DEFAULT_QUERY_TIMEOUT_MS};
pub use server::ServerConfig;
pub use upstream::{DnsServerConfig, TlsConfig};
