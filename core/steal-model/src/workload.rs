//! Workload generator
//!
//! Fixed-duration tasks with uniformly drawn arrivals over one period. The
//! sorted draws are the order statistics of a Poisson process conditioned on
//! its count.

use rand::Rng;
use tracing::debug;

use crate::error::{require_capacity, require_positive, SimError};
use crate::task::Task;

/// Largest workload a single run will generate.
///
/// A two-minute period at full load on 24 slots of 50 ms is 57 600 tasks, so
/// this leaves room for far larger pools while keeping the task list to a few
/// gigabytes.
pub const MAX_TASK_COUNT: usize = 100_000_000;

/// Workload sized to keep `load_fraction` of the pool busy on average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWorkload {
    load_fraction: f64,
    capacity: u32,
    nominal_duration_ms: f64,
    period_ms: f64,
}

impl UniformWorkload {
    pub fn new(
        load_fraction: f64,
        capacity: u32,
        nominal_duration_ms: f64,
        period_ms: f64,
    ) -> Result<Self, SimError> {
        if !load_fraction.is_finite() || load_fraction < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "load_fraction",
                value: load_fraction,
                reason: "must be finite and >= 0",
            });
        }
        require_capacity(capacity)?;
        require_positive("nominal_duration_ms", nominal_duration_ms)?;
        require_positive("period_ms", period_ms)?;

        let workload = Self {
            load_fraction,
            capacity,
            nominal_duration_ms,
            period_ms,
        };
        if workload.offered_tasks() > MAX_TASK_COUNT as f64 {
            return Err(SimError::InvalidParameter {
                name: "load_fraction",
                value: load_fraction,
                reason: "workload exceeds MAX_TASK_COUNT tasks",
            });
        }
        Ok(workload)
    }

    fn offered_tasks(&self) -> f64 {
        let offered = self.capacity as f64 * self.load_fraction * self.period_ms;
        (offered / self.nominal_duration_ms).floor()
    }

    /// Number of tasks needed to offer the requested load over the period.
    pub fn task_count(&self) -> usize {
        self.offered_tasks() as usize
    }

    /// Draw the tasks, sorted by ascending arrival.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Task> {
        let count = self.task_count();
        let mut tasks: Vec<Task> = (0..count)
            .map(|_| Task::new(rng.gen_range(0.0..self.period_ms), self.nominal_duration_ms))
            .collect();
        tasks.sort_by(|a, b| a.arrival_ms.total_cmp(&b.arrival_ms));

        debug!(
            load_fraction = self.load_fraction,
            capacity = self.capacity,
            tasks = count,
            "workload generated"
        );
        tasks
    }
}

/// Validate the parameters and draw a sorted workload in one step.
pub fn generate_workload<R: Rng + ?Sized>(
    load_fraction: f64,
    capacity: u32,
    nominal_duration_ms: f64,
    period_ms: f64,
    rng: &mut R,
) -> Result<Vec<Task>, SimError> {
    let workload = UniformWorkload::new(load_fraction, capacity, nominal_duration_ms, period_ms)?;
    Ok(workload.generate(rng))
}
