pub mod probe;

pub use probe::ProbeJob;
