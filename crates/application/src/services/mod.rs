pub mod probe_label;

pub use probe_label::{encode_base32, ProbeLabelGenerator, LABEL_ENTROPY_BYTES};
