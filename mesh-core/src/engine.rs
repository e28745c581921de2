//! The growth mesh engine: owned state plus the per-tick pipeline.

use rand::Rng;
use tracing::{info, trace};

use crate::{
    adjacency::AdjacencyBuffer,
    config::Config,
    error::Result,
    grid::SpatialGrid,
    mesh::{Mesh, NodeStatus},
    phases,
    types::NodeId,
};

/// What happened during one [`Engine::step`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// 1-based number of the tick that just ran.
    pub tick: u64,
    /// Nodes created by subdivision, in creation order.
    pub new_nodes: Vec<NodeId>,
    /// Number of edges that were split.
    pub splits: usize,
    /// Nodes that crossed the dead threshold.
    pub newly_dead: usize,
}

/// Counts a renderer or log line might want.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub nodes: usize,
    pub edges: usize,
    pub dead: usize,
    pub crowded: usize,
}

/// Owns a [`Mesh`] and advances it one tick at a time.
///
/// Callers only ever see the mesh through [`Engine::mesh`]; all mutation
/// goes through [`Engine::step`].
#[derive(Debug)]
pub struct Engine {
    mesh: Mesh,
    cfg: Config,
    adjacency: AdjacencyBuffer,
    grid: SpatialGrid,
    ticks: u64,
}

impl Engine {
    /// Wraps an existing mesh after validating `cfg`.
    pub fn new(mesh: Mesh, cfg: Config) -> Result<Self> {
        cfg.validate()?;
        let adjacency = AdjacencyBuffer::with_len(mesh.nodes.len());
        let grid = SpatialGrid::new(cfg.interaction_range());
        Ok(Self {
            mesh,
            cfg,
            adjacency,
            grid,
            ticks: 0,
        })
    }

    /// Starts from an evenly spaced ring of `count` nodes.
    pub fn ring(count: usize, cfg: Config) -> Result<Self> {
        cfg.validate()?;
        Self::new(Mesh::ring(count, &cfg)?, cfg)
    }

    /// Starts from a ring whose node radii carry random jitter.
    pub fn ring_with_jitter(count: usize, cfg: Config, rng: &mut impl Rng) -> Result<Self> {
        cfg.validate()?;
        Self::new(Mesh::ring_with_jitter(count, &cfg, rng)?, cfg)
    }

    /// Advances the simulation by exactly one tick.
    ///
    /// The tick consists of:
    /// 1. [`phases::relax_phase`]
    /// 2. [`phases::crowding_phase`]
    /// 3. [`phases::growth_phase`]
    /// 4. [`phases::split_phase`]
    /// 5. [`phases::integrate_phase`]
    pub fn step(&mut self) -> TickReport {
        phases::relax_phase(&mut self.mesh, &self.cfg);
        phases::crowding_phase(
            &mut self.mesh,
            &self.cfg,
            &mut self.adjacency,
            &mut self.grid,
        );
        phases::growth_phase(&mut self.mesh, &self.cfg);
        let new_nodes = phases::split_phase(&mut self.mesh, &self.cfg);
        let newly_dead = phases::integrate_phase(&mut self.mesh, &self.cfg);

        self.ticks += 1;
        let splits = new_nodes.len() / (self.cfg.split_parts - 1);
        trace!(
            tick = self.ticks,
            nodes = self.mesh.nodes.len(),
            edges = self.mesh.edges.len(),
            splits,
            newly_dead,
            "tick"
        );

        TickReport {
            tick: self.ticks,
            new_nodes,
            splits,
            newly_dead,
        }
    }

    /// Runs `ticks` ticks back to back and returns the final counts.
    pub fn run(&mut self, ticks: u64) -> MeshStats {
        let start_nodes = self.mesh.nodes.len();
        for _ in 0..ticks {
            self.step();
        }
        let stats = self.stats();
        info!(
            ticks,
            total_ticks = self.ticks,
            grown = stats.nodes - start_nodes,
            nodes = stats.nodes,
            edges = stats.edges,
            dead = stats.dead,
            "batch finished"
        );
        stats
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Swaps in a new configuration. The mesh itself is untouched.
    ///
    /// ### Errors
    /// Returns the validation error and keeps the old config if `cfg` is
    /// invalid.
    pub fn set_config(&mut self, cfg: Config) -> Result<()> {
        cfg.validate()?;
        self.cfg = cfg;
        Ok(())
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn status(&self, id: NodeId) -> NodeStatus {
        self.mesh.node_status(id, &self.cfg)
    }

    pub fn stats(&self) -> MeshStats {
        let mut stats = MeshStats {
            nodes: self.mesh.nodes.len(),
            edges: self.mesh.edges.len(),
            ..MeshStats::default()
        };
        for id in 0..self.mesh.nodes.len() {
            match self.status(id) {
                NodeStatus::Dead => stats.dead += 1,
                NodeStatus::Crowded => stats.crowded += 1,
                NodeStatus::Alive => {}
            }
        }
        stats
    }
}
