pub mod message;
pub mod resolver;
pub mod transport;

pub use message::{MessageBuilder, ResponseParser};
pub use resolver::{
    Do53TcpResolver, Do53UdpResolver, Doh3Resolver, DohResolver, DoqResolver, DotResolver,
    TransportResolverFactory,
};
