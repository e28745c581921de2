//! Simulation phases of one growth-mesh tick.
//!
//! [`crate::engine::Engine::step`] runs them in this order:
//! 1. [`relax_phase`] — every edge nudges its endpoints' velocities towards
//!    its rest length.
//! 2. [`crowding_phase`] — non-adjacent nodes that come too close push each
//!    other apart, and each node's crowd count is updated.
//! 3. [`growth_phase`] — edges measure themselves, age, and lengthen their
//!    rest length.
//! 4. [`split_phase`] — edges that got too long are cut into pieces.
//! 5. [`integrate_phase`] — liveness bookkeeping, damping and the position
//!    update.

use glam::Vec2;
use tracing::{debug, warn};

use crate::{
    adjacency::AdjacencyBuffer,
    config::{Config, CrowdTracking, DeathRule, GrowthPolicy},
    grid::SpatialGrid,
    mesh::{Edge, Mesh},
    types::NodeId,
};

/// Separations below this are treated as coincident: no direction can be
/// derived, so no force is applied for that pair this tick.
pub const MIN_SEPARATION: f32 = 1e-6;

/// Applies the spring impulse of every edge to its endpoints.
///
/// For an edge `(a, b)` with rest length `L` at distance `D`:
///
/// 1. If `|D - L| < cfg.tolerance` the edge is considered settled and skipped.
/// 2. If `D < MIN_SEPARATION` there is no usable direction and the edge is
///    skipped.
/// 3. Otherwise the impulse `u * (L - D) / 2 * cfg.stick_k`, with `u` the unit
///    vector from `a` to `b`, is subtracted from `a`'s velocity and added to
///    `b`'s.
///
/// Edges are visited in id order and a node shared by two edges sees both
/// impulses.
///
/// ### Parameters
/// - `mesh` - Mesh whose node velocities are updated.
/// - `cfg` - Provides `tolerance` and `stick_k`.
pub fn relax_phase(mesh: &mut Mesh, cfg: &Config) {
    for e in 0..mesh.edges.len() {
        let Edge { a, b, rest_len, .. } = mesh.edges[e];
        let delta = mesh.nodes[b].pos - mesh.nodes[a].pos;
        let dist = delta.length();
        if dist < MIN_SEPARATION || (dist - rest_len).abs() < cfg.tolerance {
            continue;
        }

        let impulse = delta / dist * ((rest_len - dist) / 2.0 * cfg.stick_k);
        mesh.nodes[a].vel -= impulse;
        mesh.nodes[b].vel += impulse;
    }
}

/// Pushes apart nearby non-adjacent nodes and refreshes crowd counts.
///
/// The adjacency buffer is rebuilt from the current edge list, then every
/// unordered pair of distinct, non-adjacent nodes is examined once:
///
/// 1. Closer than `cfg.close_dist`: both nodes' close tally goes up by one.
/// 2. Closer than `cfg.push_dist` (and not coincident): an impulse of
///    magnitude `(push_dist - d) * avoid_k` along the joining line separates
///    them. A dead node does not move, so the live one takes the whole
///    impulse; two live nodes take half each; two dead nodes are left alone.
///
/// Finally each node's `crowd_count` is set from its tally according to
/// `cfg.crowding`.
///
/// With `cfg.spatial_index` the pairs are drawn from a [`SpatialGrid`]
/// instead of the full `O(N²)` scan. The same pairs qualify either way.
///
/// ### Parameters
/// - `mesh` - Mesh whose velocities and crowd counts are updated.
/// - `cfg` - Distances, stiffness and crowd tracking policy.
/// - `adj` - Scratch adjacency, rebuilt here.
/// - `grid` - Scratch grid, rebuilt here when the spatial index is enabled.
pub fn crowding_phase(
    mesh: &mut Mesh,
    cfg: &Config,
    adj: &mut AdjacencyBuffer,
    grid: &mut SpatialGrid,
) {
    let n = mesh.nodes.len();
    adj.rebuild(n, &mesh.edges);
    let mut close = vec![0u32; n];

    if cfg.spatial_index {
        let range = cfg.interaction_range();
        if grid.cell_size() != range {
            grid.set_cell_size(range);
        }
        grid.rebuild(mesh.positions());
        for i in 0..n {
            let pos = mesh.nodes[i].pos;
            for j in grid.candidates(pos) {
                if j > i {
                    push_pair(mesh, cfg, adj, i, j, &mut close);
                }
            }
        }
    } else {
        for i in 0..n {
            for j in (i + 1)..n {
                push_pair(mesh, cfg, adj, i, j, &mut close);
            }
        }
    }

    for (node, seen) in mesh.nodes.iter_mut().zip(close) {
        node.crowd_count = match cfg.crowding {
            CrowdTracking::Sticky => node.crowd_count.max(seen),
            CrowdTracking::Fresh => seen,
        };
    }
}

fn push_pair(
    mesh: &mut Mesh,
    cfg: &Config,
    adj: &AdjacencyBuffer,
    i: NodeId,
    j: NodeId,
    close: &mut [u32],
) {
    if adj.is_adjacent(i, j) {
        return;
    }

    let delta = mesh.nodes[j].pos - mesh.nodes[i].pos;
    let range = cfg.interaction_range();
    if delta.x.abs() >= range || delta.y.abs() >= range {
        return;
    }

    let dist = delta.length();
    if dist < cfg.close_dist {
        close[i] += 1;
        close[j] += 1;
    }
    if dist >= cfg.push_dist || dist < MIN_SEPARATION {
        return;
    }

    let dead_i = mesh.nodes[i].is_dead(cfg);
    let dead_j = mesh.nodes[j].is_dead(cfg);
    let impulse = delta / dist * ((cfg.push_dist - dist) * cfg.avoid_k);
    match (dead_i, dead_j) {
        (true, true) => {}
        (true, false) => mesh.nodes[j].vel += impulse,
        (false, true) => mesh.nodes[i].vel -= impulse,
        (false, false) => {
            mesh.nodes[i].vel -= impulse / 2.0;
            mesh.nodes[j].vel += impulse / 2.0;
        }
    }
}

/// Rest-length increment for an edge whose less crowded endpoint has
/// `least` close neighbours.
///
/// Under [`GrowthPolicy::Flat`] this is always `cfg.growth_rate`. Under
/// [`GrowthPolicy::CrowdScaled`] it is `cfg.max_growth_rate` up to
/// `cfg.min_crowd`, then falls linearly to `cfg.growth_rate` at
/// `cfg.too_crowded`. An unvalidated config with `too_crowded <= min_crowd`
/// drops straight to `cfg.growth_rate` above `min_crowd`.
pub fn growth_rate(cfg: &Config, least: u32) -> f32 {
    match cfg.growth {
        GrowthPolicy::Flat => cfg.growth_rate,
        GrowthPolicy::CrowdScaled => {
            if least <= cfg.min_crowd {
                return cfg.max_growth_rate;
            }
            let span = cfg.too_crowded.saturating_sub(cfg.min_crowd);
            if span == 0 {
                return cfg.growth_rate;
            }
            let span = span as f32;
            let t = ((least - cfg.min_crowd) as f32 / span).min(1.0);
            cfg.max_growth_rate - (cfg.max_growth_rate - cfg.growth_rate) * t
        }
    }
}

/// Measures, ages and lengthens every edge.
///
/// For each edge the current length is cached in `cur_len` and `age` is
/// incremented. The rest length then grows by [`growth_rate`] unless the
/// edge is older than `cfg.growth_age_limit` or both of its endpoints are
/// crowded.
///
/// ### Parameters
/// - `mesh` - Mesh whose edges are updated; nodes are only read.
/// - `cfg` - Growth policy, rates and limits.
pub fn growth_phase(mesh: &mut Mesh, cfg: &Config) {
    for e in 0..mesh.edges.len() {
        let len = mesh.edge_length(e);
        let hemmed_in = mesh.edge_is_hemmed_in(e, cfg);
        let Edge { a, b, .. } = mesh.edges[e];
        let least = mesh.nodes[a].crowd_count.min(mesh.nodes[b].crowd_count);

        let edge = &mut mesh.edges[e];
        edge.cur_len = len;
        edge.age = edge.age.saturating_add(1);
        if edge.age > cfg.growth_age_limit || hemmed_in {
            continue;
        }
        edge.rest_len += growth_rate(cfg, least);
    }
}

/// Splits every edge that has grown past `cfg.max_edge_len`.
///
/// Only edges that existed when the phase started are examined, so each
/// original edge is split at most once and edges created here wait until
/// the next tick. An edge is split when:
///
/// 1. its cached `cur_len` and its `rest_len` are both at least
///    `cfg.max_edge_len`, and
/// 2. its endpoints are not both crowded.
///
/// See [`Mesh::split_edge`] for how the pieces are laid out.
///
/// ### Returns
/// Ids of all nodes created in this phase, in creation order.
pub fn split_phase(mesh: &mut Mesh, cfg: &Config) -> Vec<NodeId> {
    let original = mesh.edges.len();
    let mut new_ids = Vec::new();

    for e in 0..original {
        let edge = &mesh.edges[e];
        if edge.cur_len < cfg.max_edge_len || edge.rest_len < cfg.max_edge_len {
            continue;
        }
        if mesh.edge_is_hemmed_in(e, cfg) {
            continue;
        }
        new_ids.extend(mesh.split_edge(e, cfg.split_parts));
    }

    if !new_ids.is_empty() {
        debug!(
            new_nodes = new_ids.len(),
            nodes = mesh.nodes.len(),
            edges = mesh.edges.len(),
            "split long edges"
        );
    }
    new_ids
}

/// Updates liveness, damps velocities and moves every live node.
///
/// Dead nodes are frozen: their velocity is held at zero and they do not
/// move. For each live node:
///
/// 1. If it is still (both velocity components below `cfg.dead_motion`) and,
///    under [`DeathRule::CrowdedAndMotionless`], also crowded, its dead
///    counter goes up; otherwise the counter resets to 0.
/// 2. `vel *= cfg.damping`, then `pos += vel`.
///
/// A non-finite result is an invariant violation: debug builds panic,
/// release builds drop the node's velocity for this tick and log a warning.
///
/// ### Returns
/// How many nodes crossed the dead threshold this tick.
pub fn integrate_phase(mesh: &mut Mesh, cfg: &Config) -> usize {
    let mut newly_dead = 0;

    for (id, node) in mesh.nodes.iter_mut().enumerate() {
        if node.is_dead(cfg) {
            node.vel = Vec2::ZERO;
            continue;
        }

        let still = node.vel.x.abs() < cfg.dead_motion && node.vel.y.abs() < cfg.dead_motion;
        let counts = match cfg.death {
            DeathRule::Motionless => still,
            DeathRule::CrowdedAndMotionless => still && node.is_crowded(cfg),
        };
        if counts {
            node.dead_counter = node.dead_counter.saturating_add(1);
            if node.is_dead(cfg) {
                newly_dead += 1;
            }
        } else {
            node.dead_counter = 0;
        }

        let vel = node.vel * cfg.damping;
        let pos = node.pos + vel;
        debug_assert!(
            vel.is_finite() && pos.is_finite(),
            "node {id} left the finite range: pos={pos:?} vel={vel:?}"
        );
        if !(vel.is_finite() && pos.is_finite()) {
            warn!(node = id, ?pos, ?vel, "non-finite motion, dropping velocity");
            node.vel = Vec2::ZERO;
            continue;
        }
        node.vel = vel;
        node.pos = pos;
    }

    newly_dead
}
