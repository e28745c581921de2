//! Window-less batch mode: run a number of ticks and log what happened.

use std::time::{Duration, Instant};

use anyhow::Context;
use mesh_core::engine::MeshStats;
use tracing::{info, warn};

use crate::settings::Settings;

/// Ticks slower than this are reported.
pub const SLOW_TICK: Duration = Duration::from_millis(100);

/// Runs `ticks` ticks on a fresh engine.
///
/// Progress is logged every `report_every` ticks (`0` disables it) and any
/// tick slower than [`SLOW_TICK`] is logged as a warning.
///
/// ### Returns
/// The final mesh counts.
pub fn run(settings: &Settings, ticks: u64, report_every: u64) -> anyhow::Result<MeshStats> {
    let mut rng = settings.rng();
    let mut engine = settings
        .build_engine(&mut rng)
        .context("failed to build the initial ring")?;

    info!(nodes = settings.nodes, ticks, "starting headless run");
    let started = Instant::now();

    for _ in 0..ticks {
        let tick_started = Instant::now();
        let report = engine.step();
        let took = tick_started.elapsed();

        if took > SLOW_TICK {
            warn!(
                tick = report.tick,
                ms = took.as_millis() as u64,
                nodes = engine.mesh().nodes.len(),
                "slow tick"
            );
        }
        if report_every > 0 && report.tick % report_every == 0 {
            let stats = engine.stats();
            info!(
                tick = report.tick,
                nodes = stats.nodes,
                edges = stats.edges,
                dead = stats.dead,
                crowded = stats.crowded,
                "progress"
            );
        }
    }

    let stats = engine.stats();
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        nodes = stats.nodes,
        edges = stats.edges,
        dead = stats.dead,
        crowded = stats.crowded,
        "headless run finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_run_returns_final_counts() {
        let settings = Settings {
            seed: Some(3),
            ..Settings::default()
        };

        let stats = run(&settings, 50, 10).unwrap();

        assert!(stats.nodes >= settings.nodes);
        assert_eq!(stats.nodes, stats.edges);
    }

    #[test]
    fn headless_run_reports_bad_settings() {
        let settings = Settings {
            nodes: 1,
            ..Settings::default()
        };
        assert!(run(&settings, 10, 0).is_err());
    }
}
