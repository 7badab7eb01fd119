pub mod probe;

pub use probe::{CycleReport, Prober, DEFAULT_PROBE_DELAY};
