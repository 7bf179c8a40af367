//! Runtime knobs shared by the generator and prover.

#![forbid(unsafe_code)]

use rand::{rngs::StdRng, SeedableRng};

/// Chain configuration. Passed explicitly; nothing here is global.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PcdConfig {
    /// Fixed seed for key generation and proving randomness. `None` draws
    /// from OS entropy.
    pub seed: Option<u64>,
    /// Synthesize and check every witness before calling the backend.
    pub check_witness: bool,
}

impl Default for PcdConfig {
    fn default() -> Self {
        Self { seed: None, check_witness: true }
    }
}

impl PcdConfig {
    /// Start from the defaults.
    pub fn builder() -> PcdConfigBuilder {
        PcdConfigBuilder::new()
    }

    /// Seeded `StdRng` when a seed is configured, entropy-seeded otherwise.
    ///
    /// A fixed seed makes setups reproducible and is meant for tests and
    /// demos only.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Ergonomic constructor for [`PcdConfig`].
#[derive(Clone, Debug, Default)]
pub struct PcdConfigBuilder {
    cfg: PcdConfig,
}

impl PcdConfigBuilder {
    /// Builder holding [`PcdConfig::default`].
    pub fn new() -> Self {
        Self { cfg: PcdConfig::default() }
    }
    /// Deterministic randomness from `seed`.
    pub fn seed(mut self, seed: u64) -> Self { self.cfg.seed = Some(seed); self }
    /// Toggle the pre-proving satisfiability check.
    pub fn check_witness(mut self, on: bool) -> Self { self.cfg.check_witness = on; self }
    /// Finish.
    pub fn build(self) -> PcdConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn seeded_rng_is_reproducible() {
        let cfg = PcdConfig::builder().seed(42).build();
        assert_eq!(cfg.rng().next_u64(), cfg.rng().next_u64());
        assert!(cfg.check_witness);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = PcdConfig::builder().check_witness(false).build();
        assert_eq!(cfg, PcdConfig { seed: None, check_witness: false });
    }
}
