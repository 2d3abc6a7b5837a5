//! Fixed-interval pass scheduling
//!
//! The scheduler owns the loop, not the pass: it calls a pass function,
//! waits out the interval, and repeats. Sleeping is injected so tests can
//! drive many passes without waiting on real time.

use crate::error::Result;
use crate::sync::PassSummary;
use std::num::NonZeroU64;
use std::time::Duration;
use tracing::{error, info};

/// What to do when a pass fails as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the error and try again at the next interval
    #[default]
    Retry,
    /// Stop scheduling and return the error
    Abort,
}

/// Totals across all passes a scheduler ran
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Passes that ran to completion
    pub passes_completed: u64,
    /// Passes that ended with an error
    pub passes_failed: u64,
}

/// Runs a pass function every `interval`
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_passes: Option<NonZeroU64>,
    policy: FailurePolicy,
}

impl Scheduler {
    /// Unbounded scheduler retrying failed passes
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_passes: None,
            policy: FailurePolicy::Retry,
        }
    }

    /// Stop after `max_passes` passes; `None` runs forever
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: Option<NonZeroU64>) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Set the policy for failed passes
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Interval between the end of one pass and the start of the next
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run passes on real time
    ///
    /// # Errors
    ///
    /// Returns the first pass error when the policy is [`FailurePolicy::Abort`].
    pub fn run<P>(&self, pass: P) -> Result<ScheduleReport>
    where
        P: FnMut() -> Result<PassSummary>,
    {
        self.run_with_sleeper(pass, std::thread::sleep)
    }

    /// Run passes, calling `sleep` between them
    ///
    /// There is no sleep after the final pass of a bounded schedule.
    ///
    /// # Errors
    ///
    /// Returns the first pass error when the policy is [`FailurePolicy::Abort`].
    pub fn run_with_sleeper<P, S>(&self, mut pass: P, mut sleep: S) -> Result<ScheduleReport>
    where
        P: FnMut() -> Result<PassSummary>,
        S: FnMut(Duration),
    {
        let mut report = ScheduleReport::default();
        let mut pass_number = 0u64;

        loop {
            pass_number += 1;
            match pass() {
                Ok(summary) => {
                    report.passes_completed += 1;
                    info!(
                        "Pass {} complete: {} actions applied, {} failed",
                        pass_number, summary.actions_applied, summary.actions_failed
                    );
                }
                Err(e) => {
                    report.passes_failed += 1;
                    error!("Pass {} failed: {}", pass_number, e);
                    if self.policy == FailurePolicy::Abort {
                        return Err(e);
                    }
                }
            }

            if self
                .max_passes
                .is_some_and(|max| pass_number >= max.get())
            {
                return Ok(report);
            }

            sleep(self.interval);
        }
    }
}
