//! Core 2-D growth mesh library.
//!
//! A closed ring of point masses joined by springy edges relaxes towards
//! its rest lengths, pushes crowding neighbours away, slowly lengthens its
//! edges and subdivides the ones that get too long.
//!
//! Main components:
//! - [`mesh`] — node/edge arena and ring construction.
//! - [`config`] — tunables and policies, loadable from JSON.
//! - [`adjacency`] — per-tick neighbour lists rebuilt from the edges.
//! - [`grid`] — uniform grid pruning the crowding scan.
//! - [`phases`] — the individual steps of a tick.
//! - [`engine`] — owned simulation state and the tick pipeline.
//! - [`error`] — error type and `Result` alias.
//! - [`types`] — shared type aliases and IDs.

pub mod adjacency;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod phases;
pub mod types;

pub use error::{MeshError, Result};
