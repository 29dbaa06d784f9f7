//! Rolling per-analyst track record.
//!
//! Accuracy and error are exponentially weighted so recent outcomes count
//! more. Hits and misses drive a signed streak, and the streak together
//! with the previous state yields the coarse [`PerformanceState`].

use serde::{Deserialize, Serialize};
use types::{PerformanceState, Timestamp};

use crate::error::{PerformanceError, Result};
use crate::record::PerformanceRecord;
use crate::window::TimedWindow;

/// Tuning of the feedback update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// EWMA weight of the newest observation, in (0, 1].
    pub alpha: f64,
    /// Forecasts with error at or below this count as hits.
    pub hit_error_threshold: f64,
    /// |streak| at which an analyst is on a hot or cold streak.
    pub streak_threshold: u32,
    /// Confidence shift per streak step.
    pub streak_confidence_step: f64,
    /// Confidence before any outcome has been observed.
    pub initial_confidence: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            hit_error_threshold: 0.10,
            streak_threshold: 3,
            streak_confidence_step: 0.02,
            initial_confidence: 0.5,
        }
    }
}

impl FeedbackConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(PerformanceError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.hit_error_threshold >= 0.0) {
            return Err(PerformanceError::InvalidConfig(format!(
                "hit_error_threshold must be non-negative, got {}",
                self.hit_error_threshold
            )));
        }
        if self.streak_threshold == 0 {
            return Err(PerformanceError::InvalidConfig(
                "streak_threshold must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_confidence) {
            return Err(PerformanceError::InvalidConfig(format!(
                "initial_confidence must be in [0, 1], got {}",
                self.initial_confidence
            )));
        }
        Ok(())
    }
}

/// Serializable view of an analyst's rolling performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub evaluations: u64,
    pub hits: u64,
    pub accuracy: Option<f64>,
    pub mean_error: Option<f64>,
    pub streak: i32,
    pub confidence: f64,
    pub state: PerformanceState,
    pub last_30_day_accuracy: Option<f64>,
    pub last_90_day_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPerformance {
    config: FeedbackConfig,
    accuracy: Option<f64>,
    error: Option<f64>,
    error_sum: f64,
    evaluations: u64,
    hits: u64,
    streak: i32,
    confidence: f64,
    state: PerformanceState,
    last_30: TimedWindow,
    last_90: TimedWindow,
}

impl Default for RollingPerformance {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

impl RollingPerformance {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            confidence: config.initial_confidence.clamp(0.0, 1.0),
            config,
            accuracy: None,
            error: None,
            error_sum: 0.0,
            evaluations: 0,
            hits: 0,
            streak: 0,
            state: PerformanceState::Neutral,
            last_30: TimedWindow::new(30),
            last_90: TimedWindow::new(90),
        }
    }

    /// EWMA of record accuracy.
    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// EWMA of forecast error.
    pub fn error(&self) -> Option<f64> {
        self.error
    }

    /// Plain mean of every observed forecast error.
    pub fn mean_error(&self) -> Option<f64> {
        (self.evaluations > 0).then(|| self.error_sum / self.evaluations as f64)
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Positive for consecutive hits, negative for consecutive misses.
    pub fn streak(&self) -> i32 {
        self.streak
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn state(&self) -> PerformanceState {
        self.state
    }

    pub fn accuracy_last_30_days(&self, now: Timestamp) -> Option<f64> {
        self.last_30.mean_as_of(now)
    }

    pub fn accuracy_last_90_days(&self, now: Timestamp) -> Option<f64> {
        self.last_90.mean_as_of(now)
    }

    /// Fold one evaluated record into the track record.
    pub fn observe(&mut self, record: &PerformanceRecord) {
        let alpha = self.config.alpha;
        self.accuracy = Some(ewma(self.accuracy, record.accuracy, alpha));
        self.error = Some(ewma(self.error, record.forecast_error, alpha));
        self.error_sum += record.forecast_error;
        self.evaluations += 1;

        let hit = record.forecast_error <= self.config.hit_error_threshold;
        if hit {
            self.hits += 1;
        }
        self.streak = match (hit, self.streak) {
            (true, s) if s >= 0 => s.saturating_add(1),
            (true, _) => 1,
            (false, s) if s <= 0 => s.saturating_sub(1),
            (false, _) => -1,
        };
        self.state = next_state(self.state, self.streak, self.config.streak_threshold);

        let bonus = (self.streak as f64 * self.config.streak_confidence_step).clamp(-0.1, 0.1);
        let base = self.accuracy.unwrap_or(self.config.initial_confidence);
        self.confidence = (base + bonus).clamp(0.0, 1.0);

        self.last_30.push(record.evaluated_at, record.accuracy);
        self.last_90.push(record.evaluated_at, record.accuracy);
    }

    pub fn snapshot(&self, now: Timestamp) -> PerformanceSnapshot {
        PerformanceSnapshot {
            evaluations: self.evaluations,
            hits: self.hits,
            accuracy: self.accuracy,
            mean_error: self.mean_error(),
            streak: self.streak,
            confidence: self.confidence,
            state: self.state,
            last_30_day_accuracy: self.accuracy_last_30_days(now),
            last_90_day_accuracy: self.accuracy_last_90_days(now),
        }
    }
}

fn ewma(prev: Option<f64>, value: f64, alpha: f64) -> f64 {
    match prev {
        Some(prev) => alpha * value + (1.0 - alpha) * prev,
        None => value,
    }
}

fn next_state(prev: PerformanceState, streak: i32, threshold: u32) -> PerformanceState {
    let threshold = threshold as i32;
    if streak >= threshold {
        PerformanceState::HotStreak
    } else if streak <= -threshold {
        PerformanceState::ColdStreak
    } else if streak > 0
        && matches!(
            prev,
            PerformanceState::ColdStreak | PerformanceState::Recovering
        )
    {
        PerformanceState::Recovering
    } else if streak < 0
        && matches!(
            prev,
            PerformanceState::HotStreak | PerformanceState::Declining
        )
    {
        PerformanceState::Declining
    } else {
        PerformanceState::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Forecast, PendingEvaluation};
    use chrono::{Duration, TimeZone, Utc};
    use types::{ActionId, ActionType, AnalystId, Field, IdeaId, RecordId};

    fn record(day: i64, error: f64) -> PerformanceRecord {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let pending = PendingEvaluation {
            action_id: ActionId(day as u64),
            analyst_id: AnalystId(1),
            idea_id: IdeaId::new(AnalystId(1), 1),
            security_id: "SEC001".into(),
            action_type: ActionType::Update,
            issued_at: start,
            due_at: start + Duration::days(day),
            horizon_days: day as u32,
            forecast: Forecast::new(Field::Price, 100.0 * (1.0 + error), 100.0),
        };
        PerformanceRecord::evaluate(RecordId(day as u64), &pending, 100.0, pending.due_at)
    }

    #[test]
    fn test_first_observation_seeds_ewma() {
        let mut perf = RollingPerformance::default();
        perf.observe(&record(1, 0.05));
        assert!((perf.accuracy().unwrap() - 0.95).abs() < 1e-12);
        assert_eq!(perf.streak(), 1);
        assert_eq!(perf.evaluations(), 1);
    }

    #[test]
    fn test_recent_outcomes_weigh_more() {
        let mut perf = RollingPerformance::new(FeedbackConfig::default().with_alpha(0.5));
        perf.observe(&record(1, 0.0));
        perf.observe(&record(2, 0.4));
        // 0.5 * 0.6 + 0.5 * 1.0
        assert!((perf.accuracy().unwrap() - 0.8).abs() < 1e-12);
        assert!((perf.mean_error().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_streak_states() {
        let mut perf = RollingPerformance::default();
        for day in 1..=3 {
            perf.observe(&record(day, 0.01));
        }
        assert_eq!(perf.state(), PerformanceState::HotStreak);

        perf.observe(&record(4, 0.5));
        assert_eq!(perf.streak(), -1);
        assert_eq!(perf.state(), PerformanceState::Declining);

        perf.observe(&record(5, 0.5));
        perf.observe(&record(6, 0.5));
        assert_eq!(perf.state(), PerformanceState::ColdStreak);

        perf.observe(&record(7, 0.0));
        assert_eq!(perf.state(), PerformanceState::Recovering);
    }

    #[test]
    fn test_confidence_tracks_accuracy() {
        let mut good = RollingPerformance::default();
        let mut bad = RollingPerformance::default();
        for day in 1..=10 {
            good.observe(&record(day, 0.02));
            bad.observe(&record(day, 0.6));
        }
        assert!(good.confidence() > 0.9);
        assert!(bad.confidence() < 0.4);
        assert!((0.0..=1.0).contains(&bad.confidence()));
    }

    #[test]
    fn test_windowed_accuracy() {
        let mut perf = RollingPerformance::default();
        perf.observe(&record(1, 0.5));
        perf.observe(&record(80, 0.1));
        let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(80);
        assert!((perf.accuracy_last_30_days(now).unwrap() - 0.9).abs() < 1e-12);
        assert!((perf.accuracy_last_90_days(now).unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        assert!(FeedbackConfig::default().validate().is_ok());
        assert!(FeedbackConfig::default().with_alpha(0.0).validate().is_err());
        assert!(FeedbackConfig::default().with_alpha(1.5).validate().is_err());
    }
}
