//! External evidence consumed by the unfolding stages: taxonomy dumps,
//! classifier output tables, and aligner hit tables. Rows referencing node
//! ids that are no longer in the graph are skipped silently; the graph may
//! have been simplified since the evidence was produced.

pub mod alignment;
pub mod classification;
pub mod taxonomy;

pub use alignment::apply_alignments;
pub use classification::apply_classification;
pub use taxonomy::{TaxonId, Taxonomy};
