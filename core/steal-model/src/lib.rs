//! Steal-Time Model
//!
//! Fixed-duration tasks served by a pool of identical slots under processor
//! sharing. A run goes generator -> event engine -> aggregator:
//!
//! ```no_run
//! use steal_model::{compute_metrics, generate_workload, run_simulation, SimConfig};
//!
//! let config = SimConfig::new().with_capacity(8);
//! let mut rng = config.rng();
//! let mut tasks = generate_workload(0.8, config.capacity, config.nominal_duration_ms, config.period_ms, &mut rng)?;
//! run_simulation(&mut tasks, config.capacity, config.tail_margin_ms)?;
//! let metrics = compute_metrics(&tasks, config.nominal_duration_ms, config.period_ms, config.margin_fraction)?;
//! println!("{:?}", metrics.relative_steal_time);
//! # Ok::<(), steal_model::SimError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod task;
pub mod workload;

pub use config::SimConfig;
pub use engine::{run_simulation, speed_factor, EventEngine, RunStats};
pub use error::SimError;
pub use metrics::{compute_metrics, StableWindow, StealMetrics};
pub use task::Task;
pub use workload::{generate_workload, UniformWorkload, MAX_TASK_COUNT};

/// One full run at `load_fraction` using the config's seeded generator.
pub fn simulate(config: &SimConfig, load_fraction: f64) -> Result<StealMetrics, SimError> {
    config.validate()?;
    let mut rng = config.rng();
    let mut tasks = generate_workload(
        load_fraction,
        config.capacity,
        config.nominal_duration_ms,
        config.period_ms,
        &mut rng,
    )?;
    run_simulation(&mut tasks, config.capacity, config.tail_margin_ms)?;
    compute_metrics(
        &tasks,
        config.nominal_duration_ms,
        config.period_ms,
        config.margin_fraction,
    )
}
