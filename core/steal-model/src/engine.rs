//! Processor-sharing event engine
//!
//! Advances a single simulated clock from one arrival to the next. Between
//! arrivals the concurrency level is constant, so the instant at which the
//! head of the in-flight set finishes can be computed exactly instead of
//! stepping time in fixed increments.
//!
//! The head (earliest arrival) is always taken as the next task to finish.
//! That holds only when every task has the same nominal duration, which is
//! what the workload generator produces. Heterogeneous durations would need
//! the set ordered by remaining work instead.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{require_capacity, require_positive, SimError};
use crate::task::Task;

/// Slowdown applied to every in-flight task.
///
/// Up to `capacity` tasks run at native speed. Beyond that the pool is shared
/// evenly and each task progresses `in_flight / capacity` times slower.
pub fn speed_factor(in_flight: usize, capacity: u32) -> f64 {
    if in_flight <= capacity as usize {
        1.0
    } else {
        in_flight as f64 / capacity as f64
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub completed: usize,
    pub peak_in_flight: usize,
    pub end_ms: f64,
}

/// Event engine over a borrowed task list.
///
/// The engine holds the only mutable borrow of the tasks for the whole run.
/// `in_flight` stores indices into `tasks` in admission (arrival) order.
#[derive(Debug)]
pub struct EventEngine<'a> {
    tasks: &'a mut [Task],
    in_flight: VecDeque<usize>,
    capacity: u32,
    now_ms: f64,
    admitted: usize,
    completed: usize,
    peak_in_flight: usize,
}

/// Reject task fields the engine cannot serve correctly.
///
/// Durations must be positive and identical across the workload: completion
/// order is taken from arrival order, which is only exact for uniform
/// durations.
fn validate_tasks(tasks: &[Task]) -> Result<(), SimError> {
    let Some(first) = tasks.first() else {
        return Ok(());
    };
    require_positive("nominal_duration_ms", first.nominal_duration_ms)?;
    for task in tasks {
        if !task.arrival_ms.is_finite() || task.arrival_ms < 0.0 {
            return Err(SimError::InvalidParameter {
                name: "arrival_ms",
                value: task.arrival_ms,
                reason: "must be finite and >= 0",
            });
        }
        if task.nominal_duration_ms != first.nominal_duration_ms {
            return Err(SimError::InvalidParameter {
                name: "nominal_duration_ms",
                value: task.nominal_duration_ms,
                reason: "all tasks must share one duration",
            });
        }
    }
    Ok(())
}

impl<'a> EventEngine<'a> {
    pub fn new(tasks: &'a mut [Task], capacity: u32) -> Result<Self, SimError> {
        require_capacity(capacity)?;
        validate_tasks(tasks)?;
        Ok(Self {
            tasks,
            in_flight: VecDeque::new(),
            capacity,
            now_ms: 0.0,
            admitted: 0,
            completed: 0,
            peak_in_flight: 0,
        })
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks[..]
    }

    /// Serve the in-flight set up to the arrival of task `index`, then admit it.
    ///
    /// Tasks are admitted once each, in slice order.
    pub fn admit(&mut self, index: usize) -> Result<(), SimError> {
        if index != self.admitted || index >= self.tasks.len() {
            return Err(SimError::InvalidParameter {
                name: "index",
                value: index as f64,
                reason: "tasks must be admitted once each, in order",
            });
        }
        let arrival_ms = self.tasks[index].arrival_ms;
        self.advance_to(arrival_ms)?;
        self.in_flight.push_back(index);
        self.admitted += 1;
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
        self.now_ms = arrival_ms;
        Ok(())
    }

    /// Process the window `[now, end_ms)`.
    ///
    /// Completes every head that finishes inside the window, then spends the
    /// rest of the window on partial progress. Returns early, with `now` at
    /// the last completion, once the set is empty. The clock never moves
    /// backwards: an `end_ms` before `now` is rejected untouched.
    pub fn advance_to(&mut self, end_ms: f64) -> Result<(), SimError> {
        if end_ms.is_nan() || end_ms < self.now_ms {
            return Err(SimError::InvalidParameter {
                name: "end_ms",
                value: end_ms,
                reason: "window end is before the simulated clock",
            });
        }
        while let Some(&head) = self.in_flight.front() {
            let factor = speed_factor(self.in_flight.len(), self.capacity);
            let needed_ms = self.tasks[head].remaining_ms * factor;
            let window_ms = end_ms - self.now_ms;

            if needed_ms < window_ms {
                self.now_ms += needed_ms;
                self.serve(needed_ms / factor, factor);

                let task = &mut self.tasks[head];
                task.remaining_ms = 0.0;
                task.completion_ms = Some(task.completion_at(self.now_ms));
                self.in_flight.pop_front();
                self.completed += 1;
            } else {
                self.now_ms = end_ms;
                self.serve(window_ms / factor, factor);
                return Ok(());
            }
        }
        Ok(())
    }

    /// Apply the same amount of work to every in-flight task.
    fn serve(&mut self, work_ms: f64, factor: f64) {
        for &i in &self.in_flight {
            let task = &mut self.tasks[i];
            task.remaining_ms = (task.remaining_ms - work_ms).max(0.0);
            task.peak_concurrency = task.peak_concurrency.max(factor);
        }
    }

    /// Final window of `tail_margin_ms` after the last arrival.
    pub fn drain(&mut self, tail_margin_ms: f64) -> Result<(), SimError> {
        require_positive("tail_margin_ms", tail_margin_ms)?;
        self.advance_to(self.now_ms + tail_margin_ms)
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            completed: self.completed,
            peak_in_flight: self.peak_in_flight,
            end_ms: self.now_ms,
        }
    }
}

/// Run the whole workload through the engine, in place.
///
/// Every task field is validated before any task is touched. On success
/// every task has `remaining_ms == 0` and a completion time. If
/// `tail_margin_ms` is too short to drain the set, the tasks keep their
/// partial state and `SimError::Undrained` is returned.
pub fn run_simulation(
    tasks: &mut [Task],
    capacity: u32,
    tail_margin_ms: f64,
) -> Result<RunStats, SimError> {
    require_capacity(capacity)?;
    require_positive("tail_margin_ms", tail_margin_ms)?;
    if let Some(w) = tasks.windows(2).find(|w| w[1].arrival_ms < w[0].arrival_ms) {
        return Err(SimError::InvalidParameter {
            name: "arrival_ms",
            value: w[1].arrival_ms,
            reason: "tasks must be sorted by arrival",
        });
    }

    let mut engine = EventEngine::new(tasks, capacity)?;
    for index in 0..engine.tasks().len() {
        engine.admit(index)?;
    }
    engine.drain(tail_margin_ms)?;

    let stats = engine.stats();
    let remaining = engine.in_flight();
    if remaining > 0 {
        warn!(remaining, tail_margin_ms, "drain window too short");
        return Err(SimError::Undrained {
            remaining,
            tail_margin_ms,
        });
    }

    debug!(
        completed = stats.completed,
        peak_in_flight = stats.peak_in_flight,
        end_ms = stats.end_ms,
        "run drained"
    );
    Ok(stats)
}
