//! Contig attributes.

use crate::orient::Strand;
use crate::sequence;

/// Taxonomic status of a contig.
///
/// `*Inferred` variants come from annotation carried in the input graph
/// (e.g. propagated by an upstream run); direct classification only ever
/// produces `Target` or `Contaminant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeClass {
    Target,
    Contaminant,
    TargetInferred,
    ContaminantInferred,
    #[default]
    Unknown,
}

impl NodeClass {
    pub fn as_tag(self) -> &'static str {
        match self {
            NodeClass::Target => "target",
            NodeClass::Contaminant => "contaminate",
            NodeClass::TargetInferred => "target_infer",
            NodeClass::ContaminantInferred => "contaminate_infer",
            NodeClass::Unknown => "-",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "target" => NodeClass::Target,
            "contaminate" => NodeClass::Contaminant,
            "target_infer" => NodeClass::TargetInferred,
            "contaminate_infer" => NodeClass::ContaminantInferred,
            _ => NodeClass::Unknown,
        }
    }

    pub fn is_contaminant(self) -> bool {
        matches!(self, NodeClass::Contaminant | NodeClass::ContaminantInferred)
    }
}

/// A contig: its sequence plus the evidence attached by the unfolding
/// stages. Reference span 0 means unset; `None` fields are the unknown
/// sentinels of the serialized form (`-` and `?`).
#[derive(Debug, Clone)]
pub struct Contig {
    pub sequence: Vec<u8>,
    /// Sequencing depth.
    pub depth: f64,
    /// k-mer count, when the assembler reported one.
    pub kmer_count: Option<u64>,
    /// Reference accession this contig aligned to.
    pub accession: Option<String>,
    /// Strand of the reference alignment.
    pub orientation: Option<Strand>,
    /// Start of the reference span (1-based, 0 = unset).
    pub ref_start: u64,
    /// End of the reference span (0 = unset).
    pub ref_end: u64,
    pub class: NodeClass,
}

impl Contig {
    pub fn new(sequence: Vec<u8>) -> Contig {
        Contig {
            sequence,
            depth: 0.0,
            kmer_count: None,
            accession: None,
            orientation: None,
            ref_start: 0,
            ref_end: 0,
            class: NodeClass::Unknown,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    #[inline]
    pub fn gc_fraction(&self) -> f64 {
        sequence::gc_fraction(&self.sequence)
    }
}
