//! Strand-orientation algebra.
//!
//! A link between two contigs carries an [`EdgeLabel`]: the ordered pair of
//! strands on which its source and sink are traversed. Reading a link *from*
//! one of its endpoints canonicalizes it into an [`OrientedLink`], flipping
//! the label when the traversal runs against the stored direction. All
//! topology checks in the mergers work on the four per-node buckets produced
//! by [`crate::graph::AssemblyGraph::classify_links`].

use std::fmt;

use crate::error::GraphError;
use crate::graph::{LinkId, NodeId};
use crate::sequence::Overlap;

/// Reading direction of a contig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    #[inline]
    pub fn is_reverse(self) -> bool {
        self == Strand::Reverse
    }

    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }

    pub fn from_char(c: char) -> Result<Self, GraphError> {
        match c {
            '+' => Ok(Strand::Forward),
            '-' => Ok(Strand::Reverse),
            _ => Err(GraphError::InvalidStrand(c)),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Ordered (source-strand, sink-strand) pair on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeLabel(pub Strand, pub Strand);

impl EdgeLabel {
    /// The label as seen when the link is traversed sink-to-source.
    ///
    /// This is the involution {(+,+) <-> (-,-), (+,-) fixed, (-,+) fixed}:
    /// swap the strands, then flip both.
    #[inline]
    pub fn flipped(self) -> Self {
        EdgeLabel(self.1.flip(), self.0.flip())
    }

    #[inline]
    pub fn flip_source(self) -> Self {
        EdgeLabel(self.0.flip(), self.1)
    }

    #[inline]
    pub fn flip_sink(self) -> Self {
        EdgeLabel(self.0, self.1.flip())
    }

    /// Parse the `+/+` style notation used in serialized graphs.
    pub fn parse(s: &str) -> Result<Self, GraphError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next(), chars.next()) {
            (Some(a), Some('/'), Some(b), None) => {
                Ok(EdgeLabel(Strand::from_char(a)?, Strand::from_char(b)?))
            }
            _ => Err(GraphError::InvalidLabel(s.to_string())),
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// A link as seen from one of its endpoints: the far endpoint, the strands
/// in traversal order, and the overlap descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedLink {
    pub neighbour: NodeId,
    pub from: Strand,
    pub to: Strand,
    pub overlap: Overlap,
    pub link: LinkId,
}

/// Incident links of a node bucketed by direction and the strand character
/// relevant on the node's side. Self-loops are excluded.
#[derive(Debug, Clone, Default)]
pub struct LinkBuckets {
    pub plus_out: Vec<LinkId>,
    pub minus_out: Vec<LinkId>,
    pub plus_in: Vec<LinkId>,
    pub minus_in: Vec<LinkId>,
}

impl LinkBuckets {
    /// Links anchored on the node's forward side: outgoing on `+` plus
    /// incoming on `-`.
    pub fn forward_class(&self) -> Vec<LinkId> {
        let mut v = self.plus_out.clone();
        v.extend_from_slice(&self.minus_in);
        v
    }

    /// Links anchored on the node's reverse side: incoming on `+` plus
    /// outgoing on `-`.
    pub fn reverse_class(&self) -> Vec<LinkId> {
        let mut v = self.plus_in.clone();
        v.extend_from_slice(&self.minus_out);
        v
    }
}
