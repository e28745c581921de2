use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};

/// How an edge's rest length grows each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Every eligible edge grows by `Config::growth_rate`.
    Flat,
    /// The rate falls from `Config::max_growth_rate` to `Config::growth_rate`
    /// as the less crowded endpoint fills up.
    #[default]
    CrowdScaled,
}

/// How the per-tick close count is folded into `Node::crowd_count`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrowdTracking {
    /// Keep the largest count ever observed. Once crowded, always crowded.
    #[default]
    Sticky,
    /// Overwrite with this tick's count.
    Fresh,
}

/// What it takes for a node to count towards being dead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathRule {
    /// Near-zero velocity is enough.
    Motionless,
    /// Near-zero velocity while too crowded.
    #[default]
    CrowdedAndMotionless,
}

/// Tunables for the growth mesh.
///
/// All lengths are in world units and all rates are per tick. A config file
/// may name only the fields it wants to change; the rest fall back to
/// [`Config::default`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relaxation skips an edge whose length is this close to its rest length.
    pub tolerance: f32,
    /// Velocity multiplier applied each tick, in `(0, 1)`.
    pub damping: f32,
    /// Spring stiffness used by relaxation.
    pub stick_k: f32,
    /// Stiffness of the repulsion between non-adjacent nodes.
    pub avoid_k: f32,

    /// Edges longer than this (both measured and rest length) are split.
    pub max_edge_len: f32,
    /// Rest length given to the edges of a fresh ring.
    pub initial_rest_len: f32,
    /// Fraction of `count * max_edge_len` used as the ring circumference.
    pub ring_fill: f32,
    /// Upper bound of the random extra radius in jittered rings.
    pub radius_jitter: f32,

    /// Non-adjacent nodes closer than this push each other apart.
    pub push_dist: f32,
    /// Non-adjacent nodes closer than this count towards crowding; wider than `push_dist`.
    pub close_dist: f32,
    /// A node is crowded when its crowd count exceeds this.
    pub too_crowded: u32,
    /// At or below this crowd count an edge grows at full speed.
    pub min_crowd: u32,

    /// A node is dead when its dead counter exceeds this.
    pub too_dead: u32,
    /// Per-axis speed below which a node counts as still.
    pub dead_motion: f32,

    pub growth_rate: f32,
    pub max_growth_rate: f32,
    /// Edges older than this many ticks stop growing until they split.
    pub growth_age_limit: u32,
    /// Number of pieces an edge is cut into when it splits.
    pub split_parts: usize,

    pub growth: GrowthPolicy,
    pub crowding: CrowdTracking,
    pub death: DeathRule,
    /// Bin nodes into a uniform grid for the crowding scan.
    pub spatial_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            damping: 0.75,
            stick_k: 0.09,
            avoid_k: 0.01,
            max_edge_len: 0.1,
            initial_rest_len: 0.05,
            ring_fill: 0.75,
            radius_jitter: 0.1,
            push_dist: 0.2,
            close_dist: 0.35,
            too_crowded: 35,
            min_crowd: 5,
            too_dead: 20,
            dead_motion: 0.0001,
            growth_rate: 0.0002,
            max_growth_rate: 0.0005,
            growth_age_limit: 5000,
            split_parts: 2,
            growth: GrowthPolicy::CrowdScaled,
            crowding: CrowdTracking::Sticky,
            death: DeathRule::CrowdedAndMotionless,
            spatial_index: true,
        }
    }
}

impl Config {
    /// Parses a (possibly partial) JSON config and validates it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MeshError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Pretty-printed JSON, suitable for writing a starter config file.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every value is in a range the engine can work with.
    ///
    /// ### Returns
    /// - `Ok(())` if the config is usable.
    /// - `Err(MeshError::InvalidConfig)` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        fn positive(v: f32, what: &'static str) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(MeshError::InvalidConfig(what))
            }
        }
        fn non_negative(v: f32, what: &'static str) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(MeshError::InvalidConfig(what))
            }
        }

        non_negative(self.tolerance, "tolerance must be finite and >= 0")?;
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(MeshError::InvalidConfig("damping must be in (0, 1)"));
        }
        positive(self.stick_k, "stick_k must be > 0")?;
        non_negative(self.avoid_k, "avoid_k must be finite and >= 0")?;
        positive(self.max_edge_len, "max_edge_len must be > 0")?;
        positive(self.initial_rest_len, "initial_rest_len must be > 0")?;
        positive(self.ring_fill, "ring_fill must be > 0")?;
        non_negative(self.radius_jitter, "radius_jitter must be finite and >= 0")?;
        positive(self.push_dist, "push_dist must be > 0")?;
        positive(self.close_dist, "close_dist must be > 0")?;
        non_negative(self.dead_motion, "dead_motion must be finite and >= 0")?;
        non_negative(self.growth_rate, "growth_rate must be finite and >= 0")?;
        non_negative(self.max_growth_rate, "max_growth_rate must be finite and >= 0")?;

        if self.max_growth_rate < self.growth_rate {
            return Err(MeshError::InvalidConfig(
                "max_growth_rate must be >= growth_rate",
            ));
        }
        if self.too_crowded <= self.min_crowd {
            return Err(MeshError::InvalidConfig("too_crowded must exceed min_crowd"));
        }
        if self.split_parts < 2 {
            return Err(MeshError::InvalidConfig("split_parts must be at least 2"));
        }
        Ok(())
    }

    /// Radius of the initial ring for `count` nodes.
    ///
    /// The circumference is `count * ring_fill * max_edge_len`, so fresh
    /// edges start a bit shorter than the split threshold.
    pub fn ring_radius(&self, count: usize) -> f32 {
        count as f32 * self.ring_fill * self.max_edge_len / std::f32::consts::TAU
    }

    /// Range of the crowding scan: the larger of the push and close distances.
    pub fn interaction_range(&self) -> f32 {
        self.push_dist.max(self.close_dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_damping_outside_unit_interval() {
        let mut cfg = Config::default();
        cfg.damping = 1.0;
        assert!(matches!(cfg.validate(), Err(MeshError::InvalidConfig(_))));

        cfg.damping = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_growth_rates() {
        let mut cfg = Config::default();
        cfg.growth_rate = 0.01;
        cfg.max_growth_rate = 0.001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_crowd_bounds_and_split_parts() {
        let mut cfg = Config::default();
        cfg.min_crowd = cfg.too_crowded;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.split_parts = 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_nan_lengths() {
        let mut cfg = Config::default();
        cfg.push_dist = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = Config::from_json_str(
            r#"{ "max_edge_len": 0.2, "growth": "flat", "crowding": "fresh" }"#,
        )
        .unwrap();

        assert_eq!(cfg.max_edge_len, 0.2);
        assert_eq!(cfg.growth, GrowthPolicy::Flat);
        assert_eq!(cfg.crowding, CrowdTracking::Fresh);
        assert_eq!(cfg.damping, Config::default().damping);
        assert_eq!(cfg.death, DeathRule::CrowdedAndMotionless);
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let err = Config::from_json_str(r#"{ "damping": 1.5 }"#).unwrap_err();
        assert!(matches!(err, MeshError::InvalidConfig(_)));

        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, MeshError::Json(_)));
    }

    #[test]
    fn json_output_parses_back_to_the_same_config() {
        let mut cfg = Config::default();
        cfg.death = DeathRule::Motionless;
        let text = cfg.to_json_string().unwrap();
        assert_eq!(Config::from_json_str(&text).unwrap(), cfg);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MeshError::Io { .. }));
    }

    #[test]
    fn ring_radius_matches_circumference_formula() {
        let cfg = Config::default();
        let expected = 6.0 * 0.75 * 0.1 / std::f32::consts::TAU;
        assert!((cfg.ring_radius(6) - expected).abs() < 1e-7);
    }
}
