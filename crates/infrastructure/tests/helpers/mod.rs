#![allow(unused_imports)]
mod builders;
mod tls_server_mock;

pub use builders::ServerConfigBuilder;
pub use dns_server_mock::{MockTcpDnsServer, MockUdpDnsServer, ResponseMode};
pub use tls_server_mock::{
    MockDoh3Server, MockDohServer, MockDoqServer, MockDotServer, SeenDoqQuery, SeenRequest,
    TEST_SERVER_NAME,
};
