//! Schedule Estimator - pacing math for scheduling policies
//!
//! - `estimate_completion`: days until a batch of N items is done
//! - `release_rate`: items released per period
//! - `next_eligible_time`: when the next item of a running job may start
//!
//! Everything here is pure; "now" is passed in by the caller.

use crate::domain::{Job, SchedulingPolicy};
use crate::port::DAY_MS;
use serde::{Deserialize, Serialize};

use super::controller::constants::{DEFAULT_IMMEDIATE_DELAY_MS, IMMEDIATE_ITEMS_PER_DAY};

/// Expected completion horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEstimate {
    pub days: u64,
    pub completion_date: i64, // epoch ms
}

/// Items released per period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRate {
    pub items_per_period: u64,
    pub period_days: u64,
}

fn ceil_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        return 0;
    }
    a.div_ceil(b)
}

/// Schedule estimator
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEstimator {
    immediate_delay_ms: i64,
}

impl Default for ScheduleEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_IMMEDIATE_DELAY_MS)
    }
}

impl ScheduleEstimator {
    /// # Arguments
    /// * `immediate_delay_ms` - fixed gap between items in `immediate` mode
    pub fn new(immediate_delay_ms: i64) -> Self {
        Self {
            immediate_delay_ms: immediate_delay_ms.max(0),
        }
    }

    /// Days needed for `total_items` under `policy`, and the resulting date
    ///
    /// # Example
    /// ```text
    /// // 37 items, 10 every 3 days -> ceil(37/10) * 3 = 12 days
    /// let estimate = estimator.estimate_completion(37, &policy, now);
    /// assert_eq!(estimate.days, 12);
    /// ```
    pub fn estimate_completion(
        &self,
        total_items: u64,
        policy: &SchedulingPolicy,
        now_millis: i64,
    ) -> CompletionEstimate {
        let days = match *policy {
            SchedulingPolicy::Immediate => ceil_div(total_items, IMMEDIATE_ITEMS_PER_DAY),
            SchedulingPolicy::PerInterval {
                items_per_interval,
                interval_days,
            } => ceil_div(total_items, items_per_interval as u64) * interval_days as u64,
            SchedulingPolicy::DistributeOver { total_days } => total_days as u64,
        };

        CompletionEstimate {
            days,
            completion_date: now_millis.saturating_add((days as i64).saturating_mul(DAY_MS)),
        }
    }

    /// Per-period release rate for `total_items` under `policy`
    pub fn release_rate(&self, total_items: u64, policy: &SchedulingPolicy) -> ReleaseRate {
        match *policy {
            SchedulingPolicy::Immediate => ReleaseRate {
                items_per_period: IMMEDIATE_ITEMS_PER_DAY,
                period_days: 1,
            },
            SchedulingPolicy::PerInterval {
                items_per_interval,
                interval_days,
            } => ReleaseRate {
                items_per_period: items_per_interval as u64,
                period_days: interval_days as u64,
            },
            SchedulingPolicy::DistributeOver { total_days } => ReleaseRate {
                items_per_period: ceil_div(total_items, total_days as u64),
                period_days: 1,
            },
        }
    }

    /// Earliest time the next item of `job` may start.
    ///
    /// Returns `last_produced_at` itself when no wait is required.
    pub fn next_eligible_time(&self, job: &Job, last_produced_at: i64) -> i64 {
        let completed = job.progress.completed as u64;
        let total = job.progress.total as u64;

        match job.scheduling {
            SchedulingPolicy::Immediate => last_produced_at + self.immediate_delay_ms,
            SchedulingPolicy::PerInterval {
                items_per_interval,
                interval_days,
            } => {
                if completed > 0 && completed % items_per_interval.max(1) as u64 == 0 {
                    last_produced_at + interval_days as i64 * DAY_MS
                } else {
                    last_produced_at
                }
            }
            SchedulingPolicy::DistributeOver { total_days } => {
                let daily_rate = ceil_div(total, total_days as u64).max(1);
                if completed > 0 && completed % daily_rate == 0 {
                    last_produced_at + DAY_MS
                } else {
                    last_produced_at
                }
            }
        }
    }
}
