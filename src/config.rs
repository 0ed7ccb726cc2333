//! Threshold configuration shared by every stage.
//!
//! One immutable [`UnfoldConfig`] value is built by the CLI and threaded
//! explicitly through the mergers, the unfolding strategies, and the
//! external-tool runners.

/// Tuning knobs for the unfolding pipeline.
#[derive(Debug, Clone)]
pub struct UnfoldConfig {
    /// Maximum reference-span distance between linked contigs before the
    /// link is considered inconsistent.
    pub position_distance: u64,
    /// Maximum depth ratio between linked contigs before the link is cut.
    pub depth_discrepancy: f64,
    /// Maximum GC-fraction difference between linked contigs before the
    /// link is cut.
    pub gc_discrepancy: f64,
    /// Isolated contigs shorter than this are dropped during pruning.
    pub short_isolate_cutoff: usize,
    /// Alignment hits shorter than this are ignored.
    pub min_match_length: u64,
    /// Alignment hits with query coverage below this percentage are ignored.
    pub min_query_cover: f64,
    /// Hits within this percent-identity of the best hit count as
    /// equally-good placements.
    pub identity_tolerance: f64,
    /// Percent identity required to merge sibling contigs.
    pub brother_similarity: f64,
    /// Percent identity required between siblings when splitting a junction.
    pub split_similarity: f64,
    /// Required depth asymmetry between siblings of a split junction.
    pub split_depth_multi: f64,
    /// Confidence forwarded to the external classifier.
    pub classifier_confidence: f64,
    /// Hit cap forwarded to the external aligner.
    pub max_target_seqs: u32,
    /// External aligner executable (blastn-compatible output expected).
    pub aligner_cmd: String,
    /// External classifier executable (kraken2-compatible output expected).
    pub classifier_cmd: String,
}

impl Default for UnfoldConfig {
    fn default() -> Self {
        UnfoldConfig {
            position_distance: 150,
            depth_discrepancy: 20.0,
            gc_discrepancy: 0.2,
            short_isolate_cutoff: 400,
            min_match_length: 70,
            min_query_cover: 85.0,
            identity_tolerance: 1.0,
            brother_similarity: 90.0,
            split_similarity: 80.0,
            split_depth_multi: 5.0,
            classifier_confidence: 0.8,
            max_target_seqs: 5,
            aligner_cmd: "blastn".to_string(),
            classifier_cmd: "kraken2".to_string(),
        }
    }
}
