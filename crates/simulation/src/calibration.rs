//! Calibration report.
//!
//! Compares each analyst's realized behavior with the target ranges of
//! their archetype. Targets never feed back into the run; the report is a
//! check on whether the behavior parameters produce the intended persona.
//!
//! # Metrics
//! - **Accuracy**: directional hit rate over evaluated forecasts
//! - **Productivity**: actions per 30 days divided by the volume target
//! - **Timing percentile**: mean rank of the analyst's first response among
//!   all respondents to the same event (0 = fastest, 1 = slowest)

use std::collections::BTreeMap;
use std::fmt;

use behaviors::productivity::BUDGET_WINDOW_DAYS;
use serde::{Deserialize, Serialize};
use tracing::warn;
use types::{AnalystId, EventId};

use crate::runner::{Response, Simulation};

/// Outcome of comparing one metric with its target band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationStatus {
    Within,
    Below,
    Above,
    /// Not enough observations to compute the metric.
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCheck {
    pub value: Option<f64>,
    pub target: (f64, f64),
    pub status: CalibrationStatus,
}

impl MetricCheck {
    pub fn new(value: Option<f64>, target: (f64, f64)) -> Self {
        let status = match value {
            None => CalibrationStatus::Insufficient,
            Some(v) if v < target.0 => CalibrationStatus::Below,
            Some(v) if v > target.1 => CalibrationStatus::Above,
            Some(_) => CalibrationStatus::Within,
        };
        Self {
            value,
            target,
            status,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(
            self.status,
            CalibrationStatus::Below | CalibrationStatus::Above
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystCalibration {
    pub analyst_id: AnalystId,
    pub archetype: String,
    pub accuracy: MetricCheck,
    pub productivity: MetricCheck,
    pub timing_percentile: MetricCheck,
}

impl AnalystCalibration {
    pub fn mismatches(&self) -> usize {
        [&self.accuracy, &self.productivity, &self.timing_percentile]
            .into_iter()
            .filter(|m| m.is_mismatch())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub analysts: Vec<AnalystCalibration>,
}

impl CalibrationReport {
    /// Build the report from a simulation's current state.
    pub fn from_simulation(sim: &Simulation) -> Self {
        let elapsed_days = match sim.now() {
            Some(now) => (now - sim.config().start_time()).num_seconds() as f64 / 86_400.0,
            None => 0.0,
        };
        let percentiles = timing_percentiles(sim.responses());

        let analysts = sim
            .analysts()
            .iter()
            .map(|analyst| {
                let archetype = analyst.archetype();
                let targets = archetype.targets();
                let state = analyst.state();

                let productivity = (elapsed_days >= BUDGET_WINDOW_DAYS).then(|| {
                    let per_window =
                        state.actions_emitted() as f64 * BUDGET_WINDOW_DAYS / elapsed_days;
                    per_window / archetype.productivity().volume_target()
                });

                AnalystCalibration {
                    analyst_id: analyst.id(),
                    archetype: archetype.name().to_string(),
                    accuracy: MetricCheck::new(
                        state.performance().accuracy(),
                        targets.accuracy,
                    ),
                    productivity: MetricCheck::new(productivity, targets.productivity),
                    timing_percentile: MetricCheck::new(
                        percentiles.get(&analyst.id()).copied(),
                        targets.timing_percentile,
                    ),
                }
            })
            .collect();
        Self { analysts }
    }

    pub fn mismatches(&self) -> usize {
        self.analysts.iter().map(|a| a.mismatches()).sum()
    }

    pub fn get(&self, analyst: AnalystId) -> Option<&AnalystCalibration> {
        self.analysts.iter().find(|a| a.analyst_id == analyst)
    }

    /// Emit one warning per out-of-range metric.
    pub fn log_mismatches(&self) {
        for a in &self.analysts {
            for (metric, check) in [
                ("accuracy", &a.accuracy),
                ("productivity", &a.productivity),
                ("timing_percentile", &a.timing_percentile),
            ] {
                if check.is_mismatch() {
                    warn!(
                        analyst = a.analyst_id.0,
                        archetype = %a.archetype,
                        metric,
                        value = check.value,
                        low = check.target.0,
                        high = check.target.1,
                        "calibration mismatch"
                    );
                }
            }
        }
    }
}

/// Mean response-rank percentile per analyst over events with two or more
/// respondents.
pub fn timing_percentiles(
    responses: &BTreeMap<EventId, Vec<Response>>,
) -> BTreeMap<AnalystId, f64> {
    let mut sums: BTreeMap<AnalystId, (f64, u32)> = BTreeMap::new();
    for respondents in responses.values() {
        let n = respondents.len();
        if n < 2 {
            continue;
        }
        let mut ordered: Vec<&Response> = respondents.iter().collect();
        ordered.sort_by(|a, b| a.at.cmp(&b.at).then(a.analyst.cmp(&b.analyst)));
        for (rank, r) in ordered.iter().enumerate() {
            let entry = sums.entry(r.analyst).or_insert((0.0, 0));
            entry.0 += rank as f64 / (n - 1) as f64;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(id, (sum, n))| (id, sum / n as f64))
        .collect()
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |m: &MetricCheck| match m.value {
            Some(v) => format!("{v:.2} [{:.2}, {:.2}] {:?}", m.target.0, m.target.1, m.status),
            None => "-".to_string(),
        };
        writeln!(f, "Calibration ({} mismatches)", self.mismatches())?;
        for a in &self.analysts {
            writeln!(
                f,
                "  {:>4} {:<12} accuracy {}  productivity {}  timing {}",
                a.analyst_id.0,
                a.archetype,
                show(&a.accuracy),
                show(&a.productivity),
                show(&a.timing_percentile),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn response(analyst: u64, hour: u32) -> Response {
        Response {
            analyst: AnalystId(analyst),
            at: Utc.with_ymd_and_hms(2022, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_metric_check_status() {
        assert_eq!(
            MetricCheck::new(Some(0.5), (0.4, 0.8)).status,
            CalibrationStatus::Within
        );
        assert_eq!(
            MetricCheck::new(Some(0.3), (0.4, 0.8)).status,
            CalibrationStatus::Below
        );
        assert!(MetricCheck::new(Some(0.9), (0.4, 0.8)).is_mismatch());
        assert!(!MetricCheck::new(None, (0.4, 0.8)).is_mismatch());
    }

    #[test]
    fn test_timing_percentiles() {
        let mut responses = BTreeMap::new();
        responses.insert(EventId(1), vec![response(2, 15), response(1, 10), response(3, 20)]);
        responses.insert(EventId(2), vec![response(1, 9), response(2, 12)]);
        // Single respondent carries no rank information.
        responses.insert(EventId(3), vec![response(3, 8)]);

        let p = timing_percentiles(&responses);
        assert!((p[&AnalystId(1)] - 0.0).abs() < 1e-12);
        assert!((p[&AnalystId(2)] - 0.75).abs() < 1e-12);
        assert!((p[&AnalystId(3)] - 1.0).abs() < 1e-12);
    }
}
