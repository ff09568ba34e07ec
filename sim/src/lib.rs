//! Steal-Time Experiment Driver
//!
//! Sweeps, bisection search and pool-sizing experiments built on
//! `steal_model::simulate`. Every run reuses the config's seed, so a sweep is
//! reproducible point by point.

pub mod cli;
pub mod error;
pub mod logging;
pub mod report;

use serde::{Deserialize, Serialize};
use steal_model::{simulate, SimConfig, SimError};
use tracing::{debug, info};

pub use error::DriverError;

/// One row of a load sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
    pub load_pct: f64,
    pub task_count: usize,
    pub relative_steal_time: Option<f64>,
    pub sojourn_inflation: Option<f64>,
    pub mean_sojourn_ms: Option<f64>,
    pub mean_peak_concurrency: Option<f64>,
    /// Utilization plus the capacity lost to steal, in percent.
    pub effective_load_pct: Option<f64>,
}

/// Load fractions from `start_pct` to `end_pct` inclusive.
pub fn load_range(start_pct: u32, end_pct: u32, step_pct: u32) -> Vec<f64> {
    (start_pct..=end_pct)
        .step_by(step_pct.max(1) as usize)
        .map(|pct| pct as f64 / 100.0)
        .collect()
}

pub fn sweep_load(config: &SimConfig, loads: &[f64]) -> Result<Vec<LoadPoint>, SimError> {
    loads
        .iter()
        .map(|&load| {
            let m = simulate(config, load)?;
            let load_pct = load * 100.0;
            let point = LoadPoint {
                load_pct,
                task_count: m.task_count,
                relative_steal_time: m.relative_steal_time,
                sojourn_inflation: m.sojourn_inflation,
                mean_sojourn_ms: m.mean_sojourn_ms,
                mean_peak_concurrency: m.mean_peak_concurrency,
                effective_load_pct: m.relative_steal_time.map(|st| load_pct + st * 100.0),
            };
            info!(
                load_pct,
                relative_steal_time = ?point.relative_steal_time,
                mean_sojourn_ms = ?point.mean_sojourn_ms,
                mean_peak_concurrency = ?point.mean_peak_concurrency,
                "load point"
            );
            Ok(point)
        })
        .collect()
}

/// One row of a pool-size sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolPoint {
    pub capacity: u32,
    pub load_fraction: f64,
    pub relative_steal_time: Option<f64>,
    pub mean_peak_concurrency: Option<f64>,
}

/// Fixed load, varying pool size.
pub fn sweep_pool_size(
    config: &SimConfig,
    load_fraction: f64,
    capacities: impl IntoIterator<Item = u32>,
) -> Result<Vec<PoolPoint>, SimError> {
    capacities
        .into_iter()
        .map(|capacity| {
            let m = simulate(&config.clone().with_capacity(capacity), load_fraction)?;
            info!(capacity, load_fraction, relative_steal_time = ?m.relative_steal_time, "pool point");
            Ok(PoolPoint {
                capacity,
                load_fraction,
                relative_steal_time: m.relative_steal_time,
                mean_peak_concurrency: m.mean_peak_concurrency,
            })
        })
        .collect()
}

/// Highest load found for a target relative steal time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BisectOutcome {
    pub capacity: u32,
    pub target: f64,
    pub load_fraction: f64,
    pub relative_steal_time: Option<f64>,
    pub iterations: u32,
}

/// Bisect the load on `[0, 1]` until the relative steal time is within
/// `tolerance` of `target` or the bracket is narrower than `tolerance`.
///
/// Assumes steal time does not decrease with load. An undefined steal time
/// (nothing in the stable window) is treated as below the target.
pub fn bisect_load(
    config: &SimConfig,
    capacity: u32,
    target: f64,
    tolerance: f64,
) -> Result<BisectOutcome, SimError> {
    if !target.is_finite() || target < 0.0 {
        return Err(SimError::InvalidParameter {
            name: "target",
            value: target,
            reason: "must be finite and >= 0",
        });
    }
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(SimError::InvalidParameter {
            name: "tolerance",
            value: tolerance,
            reason: "must be finite and > 0",
        });
    }

    let config = config.clone().with_capacity(capacity);
    let (mut low, mut high) = (0.0_f64, 1.0_f64);
    let mut iterations = 0;
    loop {
        let load = (low + high) / 2.0;
        let steal = simulate(&config, load)?.relative_steal_time;
        iterations += 1;
        debug!(capacity, low, high, load, relative_steal_time = ?steal, "bisect step");

        match steal {
            Some(st) if st > target => high = load,
            _ => low = load,
        }

        let converged = steal.is_some_and(|st| (st - target).abs() <= tolerance);
        if converged || high - low <= tolerance {
            info!(capacity, load, relative_steal_time = ?steal, iterations, "bisect done");
            return Ok(BisectOutcome {
                capacity,
                target,
                load_fraction: load,
                relative_steal_time: steal,
                iterations,
            });
        }
    }
}

/// Pool sizing heuristic: capacity grows linearly with aggregate load plus
/// fixed headroom, clamped to `[min_capacity, max_capacity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSizingRule {
    pub max_capacity: u32,
    pub scale: f64,
    pub headroom: f64,
    pub min_capacity: u32,
}

impl Default for PoolSizingRule {
    fn default() -> Self {
        Self {
            max_capacity: 32,
            scale: 1.15,
            headroom: 4.0,
            min_capacity: 8,
        }
    }
}

/// Pool chosen for a given load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSizing {
    /// Unclamped capacity the rule asks for.
    pub raw_capacity: f64,
    pub capacity: u32,
    /// Load on the sized pool, relative to `raw_capacity`.
    pub pool_load: f64,
}

impl PoolSizingRule {
    /// `load_fraction` is the load relative to `max_capacity` slots.
    pub fn size_for(&self, load_fraction: f64) -> PoolSizing {
        let aggregate = load_fraction * self.max_capacity as f64;
        let raw_capacity = (aggregate * self.scale + self.headroom).max(1.0);
        let pool_load = if load_fraction > 0.0 {
            load_fraction * self.max_capacity as f64 / raw_capacity
        } else {
            0.0
        };
        let capacity = (raw_capacity as u32)
            .min(self.max_capacity)
            .max(self.min_capacity);
        PoolSizing {
            raw_capacity,
            capacity,
            pool_load,
        }
    }
}

/// One row of the adjusted-pool experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPoint {
    pub load_pct: f64,
    pub aggregate_load: f64,
    pub raw_capacity: f64,
    pub capacity: u32,
    pub pool_load: f64,
    pub relative_steal_time: Option<f64>,
}

/// Size the pool with `rule` at each load, then measure steal time on it.
pub fn adjusted_pool_sweep(
    config: &SimConfig,
    rule: &PoolSizingRule,
    loads: &[f64],
) -> Result<Vec<AdjustedPoint>, SimError> {
    loads
        .iter()
        .filter(|&&load| load > 0.0)
        .map(|&load| {
            let sizing = rule.size_for(load);
            let m = simulate(&config.clone().with_capacity(sizing.capacity), sizing.pool_load)?;
            let point = AdjustedPoint {
                load_pct: load * 100.0,
                aggregate_load: load * rule.max_capacity as f64,
                raw_capacity: sizing.raw_capacity,
                capacity: sizing.capacity,
                pool_load: sizing.pool_load,
                relative_steal_time: m.relative_steal_time,
            };
            info!(
                load_pct = point.load_pct,
                capacity = point.capacity,
                pool_load = point.pool_load,
                relative_steal_time = ?point.relative_steal_time,
                "adjusted point"
            );
            Ok(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> SimConfig {
        let mut config = SimConfig::new().with_capacity(4).with_seed(99);
        config.period_ms = 20_000.0;
        config
    }

    #[test]
    fn test_load_range() {
        assert_eq!(load_range(0, 10, 5), vec![0.0, 0.05, 0.1]);
        assert_eq!(load_range(1, 3, 1), vec![0.01, 0.02, 0.03]);
        // zero step is treated as one
        assert_eq!(load_range(1, 2, 0).len(), 2);
    }

    #[test]
    fn test_sweep_load_rows() {
        let points = sweep_load(&quick_config(), &[0.0, 0.5, 0.9]).unwrap();
        assert_eq!(points.len(), 3);

        assert_eq!(points[0].task_count, 0);
        assert_eq!(points[0].relative_steal_time, None);
        assert_eq!(points[0].effective_load_pct, None);

        let high = points[2];
        let st = high.relative_steal_time.unwrap();
        assert!(st > 0.0);
        assert_eq!(high.effective_load_pct, Some(high.load_pct + st * 100.0));
        assert!(st >= points[1].relative_steal_time.unwrap());
    }

    #[test]
    fn test_bigger_pool_steals_less() {
        let points = sweep_pool_size(&quick_config(), 0.8, [1, 16]).unwrap();
        assert_eq!(points[0].capacity, 1);
        assert_eq!(points[1].capacity, 16);
        let small = points[0].relative_steal_time.unwrap();
        let large = points[1].relative_steal_time.unwrap();
        assert!(small > large, "small {small} large {large}");
    }

    #[test]
    fn test_bisect_converges() {
        let config = quick_config();
        let outcome = bisect_load(&config, 4, 0.025, 0.001).unwrap();
        assert!(outcome.iterations >= 1 && outcome.iterations <= 12);
        assert!(outcome.load_fraction > 0.0 && outcome.load_fraction < 1.0);

        // the reported point is reproducible from the config alone
        let again = simulate(&config.clone().with_capacity(4), outcome.load_fraction).unwrap();
        assert_eq!(again.relative_steal_time, outcome.relative_steal_time);
    }

    #[test]
    fn test_bisect_rejects_bad_target() {
        assert!(bisect_load(&quick_config(), 4, -1.0, 0.001).is_err());
        assert!(bisect_load(&quick_config(), 4, 0.02, 0.0).is_err());
        assert!(bisect_load(&quick_config(), 0, 0.02, 0.001).is_err());
    }

    #[test]
    fn test_pool_sizing_rule() {
        let rule = PoolSizingRule::default();

        // 0.5 * 32 = 16 aggregate -> 22.4 raw
        let sizing = rule.size_for(0.5);
        assert_eq!(sizing.capacity, 22);
        assert!((sizing.raw_capacity - 22.4).abs() < 1e-9);
        assert!((sizing.pool_load - 16.0 / 22.4).abs() < 1e-9);

        // small loads are held at the minimum pool
        assert_eq!(rule.size_for(0.02).capacity, 8);
        // large loads are capped
        assert_eq!(rule.size_for(1.0).capacity, 32);
        assert_eq!(rule.size_for(0.0).pool_load, 0.0);
    }

    #[test]
    fn test_adjusted_pool_sweep_skips_zero() {
        let points = adjusted_pool_sweep(&quick_config(), &PoolSizingRule::default(), &[0.0, 0.5]).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].capacity, 22);
        assert_eq!(points[0].load_pct, 50.0);
        assert_eq!(points[0].aggregate_load, 16.0);
    }
}
