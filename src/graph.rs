//! The mutable assembly multigraph.
//!
//! Nodes are contigs keyed by a stable [`NodeId`]; links are keyed triples
//! (source, sink, key) so parallel links between the same pair coexist and
//! any single link can be removed in O(1). Node identity persists across
//! merges (one side of a merge is kept); link identity is transient.
//!
//! All mutating passes iterate over sorted id snapshots rather than live
//! map iterators, so results do not depend on hash-map ordering.

use std::fmt;

use fnv::FnvHashMap;

use crate::error::{GraphError, Result};
use crate::orient::{LinkBuckets, OrientedLink, Strand};

pub mod link;
pub mod node;

pub use link::{Link, LinkId};
pub use node::{Contig, NodeClass};

/// Newtype for contig identifiers, taken from GFA segment names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline]
    fn from(num: u64) -> Self {
        NodeId(num)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(num: usize) -> Self {
        NodeId(num as u64)
    }
}

impl From<NodeId> for u64 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Directed multigraph of contigs and overlap links.
#[derive(Debug, Default, Clone)]
pub struct AssemblyGraph {
    nodes: FnvHashMap<NodeId, Contig>,
    links: FnvHashMap<LinkId, Link>,
    out: FnvHashMap<NodeId, Vec<LinkId>>,
    inc: FnvHashMap<NodeId, Vec<LinkId>>,
}

impl AssemblyGraph {
    pub fn new() -> AssemblyGraph {
        Default::default()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Contig> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Contig> {
        self.nodes.get_mut(&id)
    }

    /// Like [`Self::node`], but absence is an error. For algorithm
    /// internals where a dangling id indicates a bookkeeping bug.
    pub fn contig(&self, id: NodeId) -> Result<&Contig> {
        self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn contig_mut(&mut self, id: NodeId) -> Result<&mut Contig> {
        self.nodes.get_mut(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn add_node(&mut self, id: NodeId, contig: Contig) {
        self.nodes.insert(id, contig);
        self.out.entry(id).or_default();
        self.inc.entry(id).or_default();
    }

    /// Remove a node and every link incident to it.
    pub fn remove_node(&mut self, id: NodeId) {
        for lid in self.incident_links(id) {
            self.remove_link(lid);
        }
        self.nodes.remove(&id);
        self.out.remove(&id);
        self.inc.remove(&id);
    }

    /// Sorted snapshot of all node ids.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted snapshot of all link ids.
    pub fn link_ids(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self.links.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Insert a link, assigning the lowest key above any existing parallel
    /// link between the same ordered pair.
    pub fn add_link(
        &mut self,
        source: NodeId,
        sink: NodeId,
        link: Link,
    ) -> LinkId {
        let key = self
            .out
            .get(&source)
            .map(|ids| {
                ids.iter()
                    .filter(|l| l.sink == sink)
                    .map(|l| l.key + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        let id = LinkId::new(source, sink, key);
        self.links.insert(id, link);
        self.out.entry(source).or_default().push(id);
        self.inc.entry(sink).or_default().push(id);
        id
    }

    pub fn remove_link(&mut self, id: LinkId) {
        if self.links.remove(&id).is_none() {
            return;
        }
        if let Some(ids) = self.out.get_mut(&id.source) {
            ids.retain(|l| *l != id);
        }
        if let Some(ids) = self.inc.get_mut(&id.sink) {
            ids.retain(|l| *l != id);
        }
    }

    /// Any link with the given ordered endpoints?
    pub fn has_link_between(&self, source: NodeId, sink: NodeId) -> bool {
        self.out
            .get(&source)
            .map(|ids| ids.iter().any(|l| l.sink == sink))
            .unwrap_or(false)
    }

    pub fn out_links(&self, node: NodeId) -> &[LinkId] {
        self.out.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn in_links(&self, node: NodeId) -> &[LinkId] {
        self.inc.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All links touching a node, self-loops included once.
    pub fn incident_links(&self, node: NodeId) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .out_links(node)
            .iter()
            .chain(self.in_links(node).iter())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        self.out_links(node).len() + self.in_links(node).len()
    }

    /// Bucket a node's incident links by direction and the strand on the
    /// node's side of the label; self-loops are excluded. This drives every
    /// topology check in the mergers.
    pub fn classify_links(&self, node: NodeId) -> LinkBuckets {
        let mut buckets = LinkBuckets::default();
        for &lid in self.out_links(node) {
            if lid.is_self_loop() {
                continue;
            }
            let link = &self.links[&lid];
            match link.label.0 {
                Strand::Forward => buckets.plus_out.push(lid),
                Strand::Reverse => buckets.minus_out.push(lid),
            }
        }
        for &lid in self.in_links(node) {
            if lid.is_self_loop() {
                continue;
            }
            let link = &self.links[&lid];
            match link.label.1 {
                Strand::Forward => buckets.plus_in.push(lid),
                Strand::Reverse => buckets.minus_in.push(lid),
            }
        }
        buckets
    }

    /// Canonicalize a link relative to one endpoint. When `node` is the
    /// sink the label is read as stored; when it is the source the label is
    /// flipped first, so `(from, to)` always describes the traversal
    /// arriving at `node`.
    pub fn oriented(&self, node: NodeId, id: LinkId) -> Result<OrientedLink> {
        let link = self
            .links
            .get(&id)
            .ok_or(GraphError::EndpointMismatch { node, link: id })?;
        if node == id.sink {
            Ok(OrientedLink {
                neighbour: id.source,
                from: link.label.0,
                to: link.label.1,
                overlap: link.overlap,
                link: id,
            })
        } else if node == id.source {
            let flipped = link.label.flipped();
            Ok(OrientedLink {
                neighbour: id.sink,
                from: flipped.0,
                to: flipped.1,
                overlap: link.overlap,
                link: id,
            })
        } else {
            Err(GraphError::EndpointMismatch { node, link: id })
        }
    }

    /// Weakly-connected components, each a sorted list of node ids.
    pub fn components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: fnv::FnvHashSet<NodeId> = Default::default();
        let mut components = Vec::new();
        for start in self.node_ids() {
            if seen.contains(&start) {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start];
            seen.insert(start);
            while let Some(node) = stack.pop() {
                component.push(node);
                let neighbours = self
                    .out_links(node)
                    .iter()
                    .map(|l| l.sink)
                    .chain(self.in_links(node).iter().map(|l| l.source));
                for next in neighbours {
                    if seen.insert(next) {
                        stack.push(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }
}
