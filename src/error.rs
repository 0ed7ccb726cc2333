use thiserror::Error;

use crate::graph::{LinkId, NodeId};

/// Fatal conditions in the graph-rewriting core.
///
/// Every variant names the offending element where one exists; evidence
/// rows that reference unknown nodes are *not* errors and are skipped by
/// the parsers instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("invalid CIGAR {cigar:?}: expected a single <N>M overlap token")]
    BadCigar { cigar: String },

    #[error("overlap of {overlap} exceeds sequence length {len}")]
    OverlapTooLong { overlap: usize, len: usize },

    #[error("invalid strand character {0:?}: expected '+' or '-'")]
    InvalidStrand(char),

    #[error("invalid edge label {0:?}: expected +/+, +/-, -/- or -/+")]
    InvalidLabel(String),

    #[error("node {node} is not an endpoint of link {link}")]
    EndpointMismatch { node: NodeId, link: LinkId },

    #[error("consensus inputs differ in length: {left} vs {right}")]
    ConsensusLength { left: usize, right: usize },

    #[error("invalid sequence byte {byte:?} (0x{byte:02x})")]
    InvalidBase { byte: u8 },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("sibling links of node {node} disagree on direction")]
    SiblingDirection { node: NodeId },
}

pub type Result<T> = std::result::Result<T, GraphError>;
