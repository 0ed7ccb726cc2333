//! Keyed links between contigs.

use std::fmt;

use crate::graph::NodeId;
use crate::orient::EdgeLabel;
use crate::sequence::Overlap;

/// Identity of a link: ordered endpoints plus a key disambiguating
/// parallel links. Link identity is transient; rewrites freely destroy and
/// recreate links while node identity persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId {
    pub source: NodeId,
    pub sink: NodeId,
    pub key: u32,
}

impl LinkId {
    #[inline]
    pub fn new(source: NodeId, sink: NodeId, key: u32) -> LinkId {
        LinkId { source, sink, key }
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.sink
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    #[inline]
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.sink)
        } else if node == self.sink {
            Some(self.source)
        } else {
            None
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}#{}", self.source, self.sink, self.key)
    }
}

/// Link payload: the strand label and the overlap descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub label: EdgeLabel,
    pub overlap: Overlap,
}

impl Link {
    pub fn new(label: EdgeLabel, overlap: Overlap) -> Link {
        Link { label, overlap }
    }
}
