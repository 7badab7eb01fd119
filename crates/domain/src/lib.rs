//! dnspulse domain layer
pub mod config;
pub mod errors;
pub mod protocol;
pub mod server_binding;

pub use config::{CliOverrides, Config, ConfigError, DnsServerConfig, DomainTarget, TlsConfig};
pub use errors::DomainError;
pub use protocol::Protocol;
pub use server_binding::{ServerBinding, ServerKey, TlsParams};
