#![allow(dead_code)]

use async_trait::async_trait;
use dnspulse_application::ports::{
    DnsResolver, MetricsSink, ProbeOutcome, QueryResult, ResolverFactory,
};
use dnspulse_domain::{DnsServerConfig, DomainError, Protocol, ServerBinding};
use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::RecordType;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct CountingResolver {
    protocol: Protocol,
    stalled: bool,
    queries: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingResolver {
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for CountingResolver {
    async fn query(
        &self,
        _cancel: &CancellationToken,
        _hostname: &str,
        _record_type: RecordType,
    ) -> QueryResult {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.stalled {
            // ignores cancellation, like a transport stuck in a blocking call
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        QueryResult::succeeded(
            Message::new(1, MessageType::Response, OpCode::Query),
            Duration::from_millis(10),
        )
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingFactory {
    built: Mutex<Vec<Arc<CountingResolver>>>,
    stalled: bool,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolvers whose queries never return.
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    pub fn resolver(&self) -> Arc<CountingResolver> {
        Arc::clone(&self.built.lock().unwrap()[0])
    }
}

impl ResolverFactory for CountingFactory {
    fn build(
        &self,
        server: &DnsServerConfig,
        _timeout: Duration,
    ) -> Result<Arc<dyn DnsResolver>, DomainError> {
        let binding = ServerBinding::from_config(server)?;
        let resolver = Arc::new(CountingResolver {
            protocol: binding.protocol,
            stalled: self.stalled,
            queries: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        });
        self.built.lock().unwrap().push(Arc::clone(&resolver));
        Ok(resolver)
    }
}

#[derive(Default)]
pub struct CountingSink {
    recorded: AtomicUsize,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.recorded.load(Ordering::SeqCst)
    }
}

impl MetricsSink for CountingSink {
    fn record_query(&self, _outcome: &ProbeOutcome) {
        self.recorded.fetch_add(1, Ordering::SeqCst);
    }
}
