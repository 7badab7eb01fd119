#![allow(dead_code)]


pub use mock_resolvers::{MockResolver, MockResolverFactory, RecordingSink};
