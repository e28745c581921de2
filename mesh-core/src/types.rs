/// Identifier for a node in a [`crate::mesh::Mesh`].
///
/// This is an index into `Mesh::nodes`. Nodes are never removed, so an id
/// stays valid for the lifetime of the mesh that issued it.
pub type NodeId = usize;

/// Identifier for an edge in a [`crate::mesh::Mesh`].
///
/// Index into `Mesh::edges`; append-only like [`NodeId`].
pub type EdgeId = usize;
