//! Start-up settings shared by the window and headless modes.

use mesh_core::{config::Config, engine::Engine};
use rand::{SeedableRng, rngs::StdRng};

/// Everything needed to build a fresh [`Engine`].
///
/// ### Fields
/// - `cfg` - Engine configuration.
/// - `nodes` - Number of nodes in the initial ring.
/// - `jitter` - Whether each node's radius gets random jitter.
/// - `seed` - Seed for the jitter RNG; `None` draws one from the OS.
#[derive(Clone, Debug)]
pub struct Settings {
    pub cfg: Config,
    pub nodes: usize,
    pub jitter: bool,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cfg: Config::default(),
            nodes: 6,
            jitter: true,
            seed: None,
        }
    }
}

impl Settings {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Builds an engine on a fresh ring, drawing jitter from `rng`.
    pub fn build_engine(&self, rng: &mut StdRng) -> mesh_core::Result<Engine> {
        if self.jitter {
            Engine::ring_with_jitter(self.nodes, self.cfg, rng)
        } else {
            Engine::ring(self.nodes, self.cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_settings_build_identical_rings() {
        let settings = Settings {
            seed: Some(11),
            ..Settings::default()
        };

        let a = settings.build_engine(&mut settings.rng()).unwrap();
        let b = settings.build_engine(&mut settings.rng()).unwrap();

        assert_eq!(a.mesh().nodes, b.mesh().nodes);
    }

    #[test]
    fn too_few_nodes_is_an_error() {
        let settings = Settings {
            nodes: 2,
            ..Settings::default()
        };
        assert!(settings.build_engine(&mut settings.rng()).is_err());
    }
}
