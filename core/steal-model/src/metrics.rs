//! Metrics aggregator
//!
//! Steal time and sojourn statistics over a completed run. Ratios that would
//! divide by zero are reported as `None`.

use serde::{Deserialize, Serialize};

use crate::config::validate_margin_fraction;
use crate::error::{require_positive, SimError};
use crate::task::{floor_steal, Task};

/// Summary statistics of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StealMetrics {
    pub task_count: usize,
    /// Tasks inside the stable-regime window.
    pub stable_task_count: usize,
    pub total_steal_ms: f64,
    pub mean_sojourn_ms: Option<f64>,
    pub mean_peak_concurrency: Option<f64>,
    /// Stable-window steal time over stable-window nominal service time.
    pub relative_steal_time: Option<f64>,
    /// `mean_sojourn / nominal_duration - 1`
    pub sojourn_inflation: Option<f64>,
    /// Total steal time per unit of simulated period.
    pub steal_per_period: f64,
}

/// The part of the period clear of startup and drain transients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableWindow {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl StableWindow {
    pub fn new(period_ms: f64, margin_fraction: f64) -> Self {
        let margin_ms = margin_fraction * period_ms;
        Self {
            start_ms: margin_ms,
            end_ms: period_ms - margin_ms,
        }
    }

    /// Both bounds are exclusive.
    pub fn contains(&self, arrival_ms: f64, completion_ms: f64) -> bool {
        arrival_ms > self.start_ms && completion_ms < self.end_ms
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}

pub fn compute_metrics(
    tasks: &[Task],
    nominal_duration_ms: f64,
    period_ms: f64,
    margin_fraction: f64,
) -> Result<StealMetrics, SimError> {
    require_positive("nominal_duration_ms", nominal_duration_ms)?;
    require_positive("period_ms", period_ms)?;
    validate_margin_fraction(margin_fraction)?;

    let window = StableWindow::new(period_ms, margin_fraction);

    let mut total_steal_ms = 0.0;
    let mut total_sojourn_ms = 0.0;
    let mut total_peak = 0.0;
    let mut stable_task_count = 0;
    let mut stable_steal_ms = 0.0;
    let mut stable_nominal_ms = 0.0;

    for (index, task) in tasks.iter().enumerate() {
        if task.nominal_duration_ms != nominal_duration_ms {
            return Err(SimError::InvalidParameter {
                name: "nominal_duration_ms",
                value: task.nominal_duration_ms,
                reason: "task duration differs from the run's nominal duration",
            });
        }
        let completion_ms = task
            .completion_ms
            .ok_or(SimError::IncompleteTask { index })?;
        let sojourn_ms = completion_ms - task.arrival_ms;
        let steal_ms = floor_steal(sojourn_ms - nominal_duration_ms);

        total_steal_ms += steal_ms;
        total_sojourn_ms += sojourn_ms;
        total_peak += task.peak_concurrency;

        if window.contains(task.arrival_ms, completion_ms) {
            stable_task_count += 1;
            stable_steal_ms += steal_ms;
            stable_nominal_ms += nominal_duration_ms;
        }
    }

    let mean_sojourn_ms = mean(total_sojourn_ms, tasks.len());
    let relative_steal_time = (stable_nominal_ms > 0.0).then(|| stable_steal_ms / stable_nominal_ms);

    Ok(StealMetrics {
        task_count: tasks.len(),
        stable_task_count,
        total_steal_ms,
        mean_sojourn_ms,
        mean_peak_concurrency: mean(total_peak, tasks.len()),
        relative_steal_time,
        sojourn_inflation: mean_sojourn_ms.map(|m| m / nominal_duration_ms - 1.0),
        steal_per_period: total_steal_ms / period_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(arrival_ms: f64, completion_ms: f64, peak: f64) -> Task {
        let mut task = Task::new(arrival_ms, 50.0);
        task.remaining_ms = 0.0;
        task.completion_ms = Some(completion_ms);
        task.peak_concurrency = peak;
        task
    }

    #[test]
    fn test_stable_window_bounds() {
        let window = StableWindow::new(1000.0, 0.01);
        assert_eq!(window.start_ms, 10.0);
        assert_eq!(window.end_ms, 990.0);
        assert!(!window.contains(10.0, 60.0));
        assert!(window.contains(10.5, 60.0));
        assert!(!window.contains(900.0, 990.0));
    }

    #[test]
    fn test_aggregates() {
        let tasks = vec![
            done(5.0, 55.0, 1.0),     // startup transient, no steal
            done(100.0, 175.0, 2.0),  // steal 25
            done(200.0, 250.0, 1.0),  // no steal
            done(960.0, 1010.0, 1.0), // drain transient
        ];
        let m = compute_metrics(&tasks, 50.0, 1000.0, 0.01).unwrap();

        assert_eq!(m.task_count, 4);
        assert_eq!(m.stable_task_count, 2);
        assert_eq!(m.total_steal_ms, 25.0);
        assert_eq!(m.mean_sojourn_ms, Some(56.25));
        assert_eq!(m.mean_peak_concurrency, Some(1.25));
        assert_eq!(m.relative_steal_time, Some(0.25));
        assert_eq!(m.sojourn_inflation, Some(0.125));
        assert_eq!(m.steal_per_period, 0.025);
    }

    #[test]
    fn test_rounding_below_nominal_counts_as_zero_steal() {
        let tasks = vec![done(100.0, 149.999_999_999_9, 1.0)];
        let m = compute_metrics(&tasks, 50.0, 1000.0, 0.01).unwrap();
        assert_eq!(m.total_steal_ms, 0.0);
        assert_eq!(m.relative_steal_time, Some(0.0));
    }

    #[test]
    fn test_empty_is_undefined_not_error() {
        let m = compute_metrics(&[], 50.0, 120_000.0, 0.01).unwrap();
        assert_eq!(m.task_count, 0);
        assert_eq!(m.total_steal_ms, 0.0);
        assert_eq!(m.mean_sojourn_ms, None);
        assert_eq!(m.mean_peak_concurrency, None);
        assert_eq!(m.relative_steal_time, None);
        assert_eq!(m.sojourn_inflation, None);
    }

    #[test]
    fn test_degenerate_stable_window() {
        // every task sits in a transient region
        let tasks = vec![done(1.0, 51.0, 1.0), done(980.0, 1030.0, 1.0)];
        let m = compute_metrics(&tasks, 50.0, 1000.0, 0.01).unwrap();
        assert_eq!(m.stable_task_count, 0);
        assert_eq!(m.relative_steal_time, None);
        assert_eq!(m.mean_sojourn_ms, Some(50.0));
    }

    #[test]
    fn test_incomplete_task_is_rejected() {
        let tasks = vec![done(100.0, 150.0, 1.0), Task::new(200.0, 50.0)];
        assert!(matches!(
            compute_metrics(&tasks, 50.0, 1000.0, 0.01),
            Err(SimError::IncompleteTask { index: 1 })
        ));
    }

    #[test]
    fn test_duration_mismatch_is_rejected() {
        // tasks built with 50 ms, aggregated as if they were 40 ms
        let tasks = vec![done(100.0, 175.0, 2.0)];
        assert!(matches!(
            compute_metrics(&tasks, 40.0, 1000.0, 0.01),
            Err(SimError::InvalidParameter { name: "nominal_duration_ms", .. })
        ));

        let mut mixed = vec![done(100.0, 150.0, 1.0), done(200.0, 250.0, 1.0)];
        mixed[1].nominal_duration_ms = 25.0;
        assert!(compute_metrics(&mixed, 50.0, 1000.0, 0.01).is_err());
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(compute_metrics(&[], 0.0, 1000.0, 0.01).is_err());
        assert!(compute_metrics(&[], 50.0, 0.0, 0.01).is_err());
        assert!(compute_metrics(&[], 50.0, 1000.0, -0.1).is_err());
        assert!(compute_metrics(&[], 50.0, 1000.0, 0.6).is_err());
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let m = compute_metrics(&[], 50.0, 1000.0, 0.01).unwrap();
        let json = serde_json::to_value(m).unwrap();
        assert!(json["relative_steal_time"].is_null());
        assert_eq!(json["task_count"], 0);
    }
}
