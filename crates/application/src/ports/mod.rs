mod dns_resolver;
mod metrics;
mod resolver_factory;

pub use dns_resolver::{DnsResolver, QueryResult};
pub use metrics::{MetricsExporter, MetricsSink, ProbeOutcome};
pub use resolver_factory::ResolverFactory;
