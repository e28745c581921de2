//! Node/edge arena for the growth mesh.
//!
//! Both sequences are append-only: subdivision pushes new nodes and edges at
//! the end and re-points one endpoint of the edge being split, so every
//! [`NodeId`] and [`EdgeId`] handed out stays valid.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::config::Config;
use crate::error::{MeshError, Result};
use crate::types::{EdgeId, NodeId};

/// Smallest ring that still forms a proper cycle.
pub const MIN_RING_NODES: usize = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Non-adjacent neighbours within `Config::close_dist`.
    pub crowd_count: u32,
    /// Consecutive ticks this node has spent still (and, depending on the
    /// death rule, crowded).
    pub dead_counter: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    /// Length the relaxation pulls this edge towards.
    pub rest_len: f32,
    /// Length measured during the last growth phase.
    pub cur_len: f32,
    /// Ticks since creation or the last split.
    pub age: u32,
}

/// Coarse classification of a node, mainly for renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Alive,
    Crowded,
    Dead,
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Node {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            crowd_count: 0,
            dead_counter: 0,
        }
    }

    #[inline]
    pub fn is_dead(&self, cfg: &Config) -> bool {
        self.dead_counter > cfg.too_dead
    }

    #[inline]
    pub fn is_crowded(&self, cfg: &Config) -> bool {
        self.crowd_count > cfg.too_crowded
    }
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId, rest_len: f32) -> Self {
        Self {
            a,
            b,
            rest_len,
            cur_len: 0.0,
            age: 0,
        }
    }

    /// Returns the endpoint opposite `id`, or `None` if `id` is not on this edge.
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

impl Mesh {
    /// Builds an evenly spaced ring of `count` nodes.
    ///
    /// Nodes sit on a circle of radius [`Config::ring_radius`]; edge `i`
    /// joins node `i` to node `(i + 1) % count` with rest length
    /// `cfg.initial_rest_len`.
    ///
    /// ### Errors
    /// [`MeshError::RingTooSmall`] if `count` is below [`MIN_RING_NODES`].
    pub fn ring(count: usize, cfg: &Config) -> Result<Self> {
        let radius = cfg.ring_radius(count);
        Self::ring_with(count, cfg, |_| radius)
    }

    /// Like [`Mesh::ring`], but each node's radius gets a uniform random
    /// extra in `[0, cfg.radius_jitter)`.
    pub fn ring_with_jitter(count: usize, cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        let radius = cfg.ring_radius(count);
        let jitter = cfg.radius_jitter;
        Self::ring_with(count, cfg, |_| {
            if jitter > 0.0 {
                radius + rng.random_range(0.0..jitter)
            } else {
                radius
            }
        })
    }

    fn ring_with(
        count: usize,
        cfg: &Config,
        mut radius_of: impl FnMut(usize) -> f32,
    ) -> Result<Self> {
        if count < MIN_RING_NODES {
            return Err(MeshError::RingTooSmall {
                got: count,
                min: MIN_RING_NODES,
            });
        }

        let step = TAU / count as f32;
        let nodes = (0..count)
            .map(|i| {
                let r = radius_of(i);
                let theta = step * i as f32;
                Node::at(Vec2::new(theta.cos() * r, theta.sin() * r))
            })
            .collect();
        let edges = (0..count)
            .map(|i| Edge::new(i, (i + 1) % count, cfg.initial_rest_len))
            .collect();

        let mut mesh = Self { nodes, edges };
        for e in 0..mesh.edges.len() {
            mesh.edges[e].cur_len = mesh.edge_length(e);
        }
        Ok(mesh)
    }

    /// Wraps pre-built nodes and edges, checking that every edge is usable.
    ///
    /// ### Errors
    /// - [`MeshError::DanglingEdge`] if an edge names a missing node.
    /// - [`MeshError::SelfLoop`] if an edge starts and ends on the same node.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let len = nodes.len();
        for (id, e) in edges.iter().enumerate() {
            for node in [e.a, e.b] {
                if node >= len {
                    return Err(MeshError::DanglingEdge { edge: id, node, len });
                }
            }
            if e.a == e.b {
                return Err(MeshError::SelfLoop(id));
            }
        }
        Ok(Self { nodes, edges })
    }

    pub fn add_node(&mut self, pos: Vec2) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::at(pos));
        id
    }

    pub fn add_edge(&mut self, a: NodeId, b: NodeId, rest_len: f32) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge::new(a, b, rest_len));
        id
    }

    /// Current Euclidean length of edge `e`.
    #[inline]
    pub fn edge_length(&self, e: EdgeId) -> f32 {
        let Edge { a, b, .. } = self.edges[e];
        self.nodes[a].pos.distance(self.nodes[b].pos)
    }

    /// Cuts edge `e` into `parts` equal pieces.
    ///
    /// `parts - 1` new nodes are placed evenly between the endpoints. The
    /// original edge keeps endpoint `a` and is re-pointed to the first new
    /// node; the remaining pieces are appended. Every piece gets
    /// `rest_len / parts` and age 0.
    ///
    /// ### Returns
    /// The ids of the new nodes, ordered from `a` towards the old `b`.
    ///
    /// ### Panics
    /// Panics if `parts < 2` or `e` is out of bounds.
    pub fn split_edge(&mut self, e: EdgeId, parts: usize) -> Vec<NodeId> {
        assert!(parts >= 2, "an edge must be split into at least two pieces");

        let Edge { a, b, rest_len, .. } = self.edges[e];
        let start = self.nodes[a].pos;
        let delta = self.nodes[b].pos - start;
        let piece = rest_len / parts as f32;

        let new_ids: Vec<NodeId> = (1..parts)
            .map(|k| self.add_node(start + delta * (k as f32 / parts as f32)))
            .collect();

        for pair in new_ids.windows(2) {
            let id = self.add_edge(pair[0], pair[1], piece);
            self.edges[id].cur_len = self.edge_length(id);
        }
        let last = *new_ids.last().unwrap_or(&a);
        let tail = self.add_edge(last, b, piece);
        self.edges[tail].cur_len = self.edge_length(tail);

        let edge = &mut self.edges[e];
        edge.b = new_ids[0];
        edge.rest_len = piece;
        edge.age = 0;
        edge.cur_len = self.nodes[a].pos.distance(self.nodes[new_ids[0]].pos);

        new_ids
    }

    /// Node positions in id order.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.nodes.iter().map(|n| n.pos)
    }

    /// Edge endpoint pairs in id order.
    pub fn edge_pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.edges.iter().map(|e| (e.a, e.b))
    }

    pub fn node_status(&self, id: NodeId, cfg: &Config) -> NodeStatus {
        let node = &self.nodes[id];
        if node.is_dead(cfg) {
            NodeStatus::Dead
        } else if node.is_crowded(cfg) {
            NodeStatus::Crowded
        } else {
            NodeStatus::Alive
        }
    }

    /// `true` when both endpoints of `e` are crowded. Such edges neither grow
    /// nor split.
    #[inline]
    pub fn edge_is_hemmed_in(&self, e: EdgeId, cfg: &Config) -> bool {
        let Edge { a, b, .. } = self.edges[e];
        self.nodes[a].is_crowded(cfg) && self.nodes[b].is_crowded(cfg)
    }

    /// `true` if any position or velocity is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| !n.pos.is_finite() || !n.vel.is_finite())
    }

    /// Checks that the edges form exactly one cycle through every node.
    ///
    /// Every node must have degree two, and walking the cycle from node 0
    /// must visit all nodes before returning.
    pub fn is_single_cycle(&self) -> bool {
        let n = self.nodes.len();
        if n < MIN_RING_NODES || self.edges.len() != n {
            return false;
        }

        let mut incident: Vec<Vec<EdgeId>> = vec![Vec::with_capacity(2); n];
        for (id, e) in self.edges.iter().enumerate() {
            incident[e.a].push(id);
            incident[e.b].push(id);
        }
        if incident.iter().any(|list| list.len() != 2) {
            return false;
        }

        let mut visited = 1;
        let mut prev_edge = incident[0][0];
        let mut current = match self.edges[prev_edge].other(0) {
            Some(id) => id,
            None => return false,
        };
        while current != 0 {
            visited += 1;
            if visited > n {
                return false;
            }
            let next_edge = if incident[current][0] == prev_edge {
                incident[current][1]
            } else {
                incident[current][0]
            };
            current = match self.edges[next_edge].other(current) {
                Some(id) => id,
                None => return false,
            };
            prev_edge = next_edge;
        }
        visited == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn ring_places_nodes_on_circle_and_links_neighbours() {
        let cfg = Config::default();
        let mesh = Mesh::ring(6, &cfg).unwrap();

        assert_eq!(mesh.nodes.len(), 6);
        assert_eq!(mesh.edges.len(), 6);

        let r = cfg.ring_radius(6);
        for n in &mesh.nodes {
            assert!((n.pos.length() - r).abs() < 1e-6);
            assert_eq!(n.vel, Vec2::ZERO);
        }
        for (i, e) in mesh.edges.iter().enumerate() {
            assert_eq!((e.a, e.b), (i, (i + 1) % 6));
            assert_eq!(e.rest_len, cfg.initial_rest_len);
            assert_eq!(e.age, 0);
        }
        assert!(mesh.is_single_cycle());
    }

    #[test]
    fn ring_rejects_too_few_nodes() {
        let err = Mesh::ring(2, &Config::default()).unwrap_err();
        assert!(matches!(err, MeshError::RingTooSmall { got: 2, min: 3 }));
    }

    #[test]
    fn jittered_ring_stays_within_jitter_band() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mesh = Mesh::ring_with_jitter(12, &cfg, &mut rng).unwrap();

        let r = cfg.ring_radius(12);
        for n in &mesh.nodes {
            let len = n.pos.length();
            assert!(len >= r - 1e-6 && len < r + cfg.radius_jitter + 1e-6);
        }
        assert!(mesh.is_single_cycle());
    }

    #[test]
    fn from_parts_rejects_dangling_and_self_loop_edges() {
        let nodes = vec![Node::at(Vec2::ZERO), Node::at(Vec2::X)];

        let err = Mesh::from_parts(nodes.clone(), vec![Edge::new(0, 5, 1.0)]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::DanglingEdge {
                edge: 0,
                node: 5,
                len: 2
            }
        ));

        let err = Mesh::from_parts(nodes, vec![Edge::new(1, 1, 1.0)]).unwrap_err();
        assert!(matches!(err, MeshError::SelfLoop(0)));
    }

    #[test]
    fn split_edge_inserts_midpoint_and_appends_tail() {
        let cfg = Config::default();
        let mut mesh = Mesh::ring(4, &cfg).unwrap();
        mesh.edges[1].rest_len = 0.3;
        mesh.edges[1].age = 40;
        let (a, b) = (mesh.edges[1].a, mesh.edges[1].b);
        let mid = (mesh.nodes[a].pos + mesh.nodes[b].pos) / 2.0;

        let new_ids = mesh.split_edge(1, 2);

        assert_eq!(new_ids, vec![4]);
        assert_eq!(mesh.nodes.len(), 5);
        assert_eq!(mesh.edges.len(), 5);
        assert!((mesh.nodes[4].pos - mid).length() < 1e-6);

        assert_eq!((mesh.edges[1].a, mesh.edges[1].b), (a, 4));
        assert_eq!((mesh.edges[4].a, mesh.edges[4].b), (4, b));
        for id in [1, 4] {
            assert!((mesh.edges[id].rest_len - 0.15).abs() < 1e-7);
            assert_eq!(mesh.edges[id].age, 0);
        }
        assert!(mesh.is_single_cycle());
    }

    #[test]
    fn three_way_split_chains_new_nodes() {
        let cfg = Config::default();
        let mut mesh = Mesh::ring(3, &cfg).unwrap();

        let new_ids = mesh.split_edge(0, 3);

        assert_eq!(new_ids, vec![3, 4]);
        assert_eq!(mesh.nodes.len(), 5);
        assert_eq!(mesh.edges.len(), 5);
        assert_eq!((mesh.edges[0].a, mesh.edges[0].b), (0, 3));
        assert_eq!((mesh.edges[3].a, mesh.edges[3].b), (3, 4));
        assert_eq!((mesh.edges[4].a, mesh.edges[4].b), (4, 1));
        assert!(mesh.is_single_cycle());
    }

    #[test]
    fn is_single_cycle_detects_two_separate_loops() {
        let nodes = (0..6).map(|i| Node::at(Vec2::new(i as f32, 0.0))).collect();
        let edges = vec![
            Edge::new(0, 1, 1.0),
            Edge::new(1, 2, 1.0),
            Edge::new(2, 0, 1.0),
            Edge::new(3, 4, 1.0),
            Edge::new(4, 5, 1.0),
            Edge::new(5, 3, 1.0),
        ];
        let mesh = Mesh::from_parts(nodes, edges).unwrap();
        assert!(!mesh.is_single_cycle());
    }

    #[test]
    fn node_status_prefers_dead_over_crowded() {
        let cfg = Config::default();
        let mut mesh = Mesh::ring(3, &cfg).unwrap();
        mesh.nodes[0].crowd_count = cfg.too_crowded + 1;
        mesh.nodes[1].crowd_count = cfg.too_crowded + 1;
        mesh.nodes[1].dead_counter = cfg.too_dead + 1;

        assert_eq!(mesh.node_status(0, &cfg), NodeStatus::Crowded);
        assert_eq!(mesh.node_status(1, &cfg), NodeStatus::Dead);
        assert_eq!(mesh.node_status(2, &cfg), NodeStatus::Alive);
        assert!(mesh.edge_is_hemmed_in(0, &cfg));
        assert!(!mesh.edge_is_hemmed_in(1, &cfg));
    }
}
