//! Simulation configuration options.

use chrono::{Duration, NaiveDate};
use lifecycle::LifecyclePolicy;
use performance::{FeedbackConfig, Horizons};
use serde::{Deserialize, Serialize};
use types::Timestamp;
use types::time::start_of_day;

use crate::error::{Result, SimulationError};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// First day of the run.
    pub start: NaiveDate,
    /// Last day of the run (inclusive).
    pub end: NaiveDate,
    /// Run seed. Per-analyst RNGs are derived from it.
    pub seed: u64,
    /// Days between periodic review ticks (silence catch-up checks).
    pub review_interval_days: i64,
    /// Days without a relevant event or action before catch-up checks start.
    pub max_silence_days: i64,
    /// Chance per review tick that a silent analyst publishes a catch-up note.
    pub catch_up_probability: f64,
    /// Outcome horizon per action type.
    pub horizons: Horizons,
    /// EWMA and streak tuning of the feedback loop.
    pub feedback: FeedbackConfig,
    /// Lifecycle transition graph options.
    pub lifecycle: LifecyclePolicy,
    /// Run the relevance scan sequentially even with the `parallel` feature.
    pub force_sequential: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            seed: 42,
            review_interval_days: 7,
            max_silence_days: 45,
            catch_up_probability: 0.15,
            horizons: Horizons::default(),
            feedback: FeedbackConfig::default(),
            lifecycle: LifecyclePolicy::default(),
            force_sequential: false,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration for the given window.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            ..Default::default()
        }
    }

    /// First instant of the run.
    pub fn start_time(&self) -> Timestamp {
        start_of_day(self.start)
    }

    /// Last instant of the run (end of the `end` day).
    pub fn end_time(&self) -> Timestamp {
        start_of_day(self.end) + Duration::days(1) - Duration::seconds(1)
    }

    /// Run length in days.
    pub fn run_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Set the run window.
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the periodic review interval.
    pub fn with_review_interval_days(mut self, days: i64) -> Self {
        self.review_interval_days = days;
        self
    }

    /// Set the silence window and catch-up probability.
    pub fn with_silence(mut self, max_silence_days: i64, catch_up_probability: f64) -> Self {
        self.max_silence_days = max_silence_days;
        self.catch_up_probability = catch_up_probability;
        self
    }

    /// Set outcome horizons.
    pub fn with_horizons(mut self, horizons: Horizons) -> Self {
        self.horizons = horizons;
        self
    }

    /// Set feedback tuning.
    pub fn with_feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = feedback;
        self
    }

    /// Set the lifecycle policy.
    pub fn with_lifecycle(mut self, lifecycle: LifecyclePolicy) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Force sequential execution of the relevance scan.
    pub fn with_force_sequential(mut self, force: bool) -> Self {
        self.force_sequential = force;
        self
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfig(msg));
        if self.start > self.end {
            return invalid(format!("start {} is after end {}", self.start, self.end));
        }
        if self.review_interval_days <= 0 {
            return invalid("review_interval_days must be positive".into());
        }
        if self.max_silence_days <= 0 {
            return invalid("max_silence_days must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.catch_up_probability) {
            return invalid(format!(
                "catch_up_probability must be in [0, 1], got {}",
                self.catch_up_probability
            ));
        }
        self.feedback.validate()?;
        Ok(())
    }
}
