use serde::{Deserialize, Serialize};

/// Differences in simulated time below this are clock drift, not contention.
///
/// One nanosecond: several orders of magnitude above the rounding the clock
/// accumulates over a two-minute horizon, and far below any real steal.
pub const TIME_EPSILON_MS: f64 = 1e-6;

/// Steal time for a sojourn exceeding nominal service by `excess_ms`.
pub fn floor_steal(excess_ms: f64) -> f64 {
    if excess_ms > TIME_EPSILON_MS {
        excess_ms
    } else {
        0.0
    }
}

/// A fixed-duration unit of work served by the pool.
///
/// `arrival_ms` and `nominal_duration_ms` never change after creation. The
/// remaining fields are written only by the event engine during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub arrival_ms: f64,
    pub nominal_duration_ms: f64,
    pub remaining_ms: f64,
    pub completion_ms: Option<f64>,
    /// Highest slowdown factor the task was ever served under.
    pub peak_concurrency: f64,
}

impl Task {
    pub fn new(arrival_ms: f64, nominal_duration_ms: f64) -> Self {
        Self {
            arrival_ms,
            nominal_duration_ms,
            remaining_ms: nominal_duration_ms,
            completion_ms: None,
            peak_concurrency: 0.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completion_ms.is_some()
    }

    /// Time from arrival to completion, if the task has finished.
    pub fn sojourn_ms(&self) -> Option<f64> {
        self.completion_ms.map(|done| done - self.arrival_ms)
    }

    /// Sojourn time in excess of the nominal duration, floored at zero.
    pub fn steal_ms(&self) -> Option<f64> {
        self.sojourn_ms()
            .map(|sojourn| floor_steal(sojourn - self.nominal_duration_ms))
    }

    /// Earliest instant the task could physically finish.
    pub fn earliest_completion_ms(&self) -> f64 {
        self.arrival_ms + self.nominal_duration_ms
    }

    /// Completion instant for a task whose work ran out at `now_ms`, snapped
    /// to the physical lower bound when the two differ only by drift.
    pub fn completion_at(&self, now_ms: f64) -> f64 {
        let earliest = self.earliest_completion_ms();
        if now_ms > earliest + TIME_EPSILON_MS {
            now_ms
        } else {
            earliest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_snaps_to_bound() {
        let task = Task::new(0.1, 50.0);
        assert_eq!(task.completion_at(50.1 - 1e-9), task.earliest_completion_ms());
        assert_eq!(task.completion_at(50.1 + 1e-9), task.earliest_completion_ms());
        assert_eq!(task.completion_at(75.0), 75.0);
    }

    #[test]
    fn test_new_task_is_pending() {
        let task = Task::new(12.5, 50.0);
        assert_eq!(task.remaining_ms, 50.0);
        assert_eq!(task.peak_concurrency, 0.0);
        assert!(!task.is_complete());
        assert_eq!(task.sojourn_ms(), None);
        assert_eq!(task.steal_ms(), None);
    }

    #[test]
    fn test_steal_is_floored_at_zero() {
        let mut task = Task::new(10.0, 50.0);
        // completion a hair early, as floating-point drift can produce
        task.completion_ms = Some(59.999_999_999);
        assert_eq!(task.steal_ms(), Some(0.0));

        // drift above the bound is not steal either
        task.completion_ms = Some(60.000_000_000_1);
        assert_eq!(task.steal_ms(), Some(0.0));

        task.completion_ms = Some(100.0);
        assert_eq!(task.sojourn_ms(), Some(90.0));
        assert_eq!(task.steal_ms(), Some(40.0));
    }
}
