use crate::mesh::Edge;
use crate::types::NodeId;

/// Per-node neighbour lists rebuilt from the edge list every tick.
///
/// The crowding phase uses this to skip pairs that are already joined by an
/// edge. Like the other scratch buffers it keeps its allocations between
/// ticks; [`AdjacencyBuffer::rebuild`] only clears and refills them.
#[derive(Debug, Default)]
pub struct AdjacencyBuffer {
    neighbors: Vec<Vec<NodeId>>,
}

impl AdjacencyBuffer {
    /// Creates a buffer for `len` nodes with no links.
    pub fn with_len(len: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); len],
        }
    }

    /// Resizes the buffer to `len` nodes and clears every list.
    pub fn ensure_len(&mut self, len: usize) {
        self.neighbors.resize_with(len, Vec::new);
        self.clear();
    }

    pub fn clear(&mut self) {
        for list in &mut self.neighbors {
            list.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Records an undirected link between `a` and `b`.
    ///
    /// ### Panics
    /// Panics if either id is out of bounds.
    #[inline]
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        if !self.neighbors[a].contains(&b) {
            self.neighbors[a].push(b);
        }
        if !self.neighbors[b].contains(&a) {
            self.neighbors[b].push(a);
        }
    }

    /// Refills the buffer from `edges` for a mesh of `node_count` nodes.
    pub fn rebuild(&mut self, node_count: usize, edges: &[Edge]) {
        self.ensure_len(node_count);
        for e in edges {
            self.link(e.a, e.b);
        }
    }

    #[inline]
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors[a].contains(&b)
    }

    #[inline]
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.neighbors[id]
    }

    #[inline]
    pub fn degree(&self, id: NodeId) -> usize {
        self.neighbors[id].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_starts_without_links() {
        let buf = AdjacencyBuffer::with_len(4);
        assert_eq!(buf.len(), 4);
        assert!((0..4).all(|i| buf.degree(i) == 0));
    }

    #[test]
    fn link_is_symmetric_and_ignores_duplicates() {
        let mut buf = AdjacencyBuffer::with_len(3);
        buf.link(0, 2);
        buf.link(2, 0);

        assert!(buf.is_adjacent(0, 2));
        assert!(buf.is_adjacent(2, 0));
        assert!(!buf.is_adjacent(0, 1));
        assert_eq!(buf.neighbors(0), &[2]);
        assert_eq!(buf.degree(2), 1);
    }

    #[test]
    fn rebuild_replaces_previous_links_and_resizes() {
        let mut buf = AdjacencyBuffer::with_len(2);
        buf.link(0, 1);

        let edges = vec![Edge::new(1, 2, 1.0), Edge::new(2, 3, 1.0), Edge::new(3, 1, 1.0)];
        buf.rebuild(4, &edges);

        assert_eq!(buf.len(), 4);
        assert!(!buf.is_adjacent(0, 1));
        assert_eq!(buf.degree(0), 0);
        assert!(buf.is_adjacent(1, 2));
        assert!(buf.is_adjacent(1, 3));
        assert_eq!(buf.degree(1), 2);
    }

    #[test]
    fn ensure_len_can_shrink() {
        let mut buf = AdjacencyBuffer::with_len(5);
        buf.link(3, 4);
        buf.ensure_len(2);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.degree(0), 0);
    }
}
