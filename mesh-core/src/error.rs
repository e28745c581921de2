//! Error type shared by the mesh engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EdgeId, NodeId};

/// Errors that can occur while configuring or constructing a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A ring needs at least three nodes to form a cycle.
    #[error("a ring needs at least {min} nodes, got {got}")]
    RingTooSmall { got: usize, min: usize },

    /// An edge points past the end of the node list.
    #[error("edge {edge} references node {node}, but the mesh only has {len} nodes")]
    DanglingEdge {
        edge: EdgeId,
        node: NodeId,
        len: usize,
    },

    /// An edge connects a node to itself.
    #[error("edge {0} connects a node to itself")]
    SelfLoop(EdgeId),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = MeshError> = std::result::Result<T, E>;
