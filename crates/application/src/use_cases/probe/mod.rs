pub mod prober;

pub use prober::{CycleReport, Prober, DEFAULT_PROBE_DELAY};
