//! Run configuration
//!
//! Named defaults for the knobs every run needs.

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{require_capacity, require_positive, SimError};

pub const DEFAULT_CAPACITY: u32 = 24;
pub const DEFAULT_NOMINAL_DURATION_MS: f64 = 50.0;
pub const DEFAULT_PERIOD_MS: f64 = 120_000.0;
/// Must exceed the longest remaining service time of any task at the last arrival.
pub const DEFAULT_TAIL_MARGIN_MS: f64 = 120_000.0;
/// Share of the period trimmed from each end of the stable-regime window.
pub const DEFAULT_MARGIN_FRACTION: f64 = 0.01;
pub const DEFAULT_SEED: u64 = 0;

/// Parameters of a single simulation run (everything except the load).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub capacity: u32,
    pub nominal_duration_ms: f64,
    pub period_ms: f64,
    pub tail_margin_ms: f64,
    pub margin_fraction: f64,
    pub seed: u64,
}

impl SimConfig {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            nominal_duration_ms: DEFAULT_NOMINAL_DURATION_MS,
            period_ms: DEFAULT_PERIOD_MS,
            tail_margin_ms: DEFAULT_TAIL_MARGIN_MS,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        require_capacity(self.capacity)?;
        require_positive("nominal_duration_ms", self.nominal_duration_ms)?;
        require_positive("period_ms", self.period_ms)?;
        require_positive("tail_margin_ms", self.tail_margin_ms)?;
        validate_margin_fraction(self.margin_fraction)
    }

    /// Fresh generator seeded from the config, so equal configs replay equal runs.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_margin_fraction(margin_fraction: f64) -> Result<(), SimError> {
    if (0.0..0.5).contains(&margin_fraction) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter {
            name: "margin_fraction",
            value: margin_fraction,
            reason: "must lie in [0, 0.5)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capacity, 24);
        assert_eq!(config.margin_fraction, 0.01);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "capacity": 8, "seed": 42 }"#).unwrap();
        assert_eq!(config.capacity, 8);
        assert_eq!(config.seed, 42);
        assert_eq!(config.period_ms, DEFAULT_PERIOD_MS);
        assert_eq!(config.tail_margin_ms, DEFAULT_TAIL_MARGIN_MS);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SimConfig::new().with_capacity(0).validate().is_err());

        let mut config = SimConfig::new();
        config.tail_margin_ms = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidParameter { name: "tail_margin_ms", .. })
        ));

        let mut config = SimConfig::new();
        config.nominal_duration_ms = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SimConfig::new();
        config.margin_fraction = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rng_is_reproducible() {
        let config = SimConfig::new().with_seed(7);
        let a: Vec<u64> = config.rng().sample_iter(rand::distributions::Standard).take(4).collect();
        let b: Vec<u64> = config.rng().sample_iter(rand::distributions::Standard).take(4).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("steal-model-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "capacity": 4, "period_ms": 1000.0 }"#).unwrap();
        let config = SimConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.period_ms, 1000.0);

        assert!(matches!(
            SimConfig::from_json_file("/nonexistent/steal-model.json"),
            Err(SimError::Io(_))
        ));
    }
}
