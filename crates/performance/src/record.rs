//! Forecasts awaiting evaluation and the records they turn into.

use serde::{Deserialize, Serialize};
use types::{
    ActionId, ActionType, AnalystId, Field, IdeaId, RecordId, Recommendation, SecurityId,
    Timestamp,
};

/// Forward-looking value attached to a research action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Field the forecast is about (target price, EPS estimate, ...).
    pub field: Field,
    /// Forecast value.
    pub predicted: f64,
    /// Observed value of `field` when the forecast was issued.
    pub reference: f64,
    pub recommendation: Option<Recommendation>,
}

impl Forecast {
    pub fn new(field: Field, predicted: f64, reference: f64) -> Self {
        Self {
            field,
            predicted,
            reference,
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendation = Some(recommendation);
        self
    }
}

/// A scheduled evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvaluation {
    pub action_id: ActionId,
    pub analyst_id: AnalystId,
    pub idea_id: IdeaId,
    pub security_id: SecurityId,
    pub action_type: ActionType,
    pub issued_at: Timestamp,
    pub due_at: Timestamp,
    pub horizon_days: u32,
    pub forecast: Forecast,
}

/// Immutable outcome of one evaluated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub record_id: RecordId,
    pub action_id: ActionId,
    pub analyst_id: AnalystId,
    pub idea_id: IdeaId,
    pub security_id: SecurityId,
    pub action_type: ActionType,
    pub issued_at: Timestamp,
    pub evaluated_at: Timestamp,
    pub horizon_days: u32,
    pub field: Field,
    pub predicted: f64,
    pub realized: f64,
    pub reference: f64,
    /// |predicted - realized| / |realized|
    pub forecast_error: f64,
    /// (realized - reference) / reference
    pub realized_return: f64,
    /// Whether the recommendation's direction matched the realized move.
    /// `None` for Hold or when no recommendation was made.
    pub direction_correct: Option<bool>,
    /// 1 - forecast_error, floored at 0.
    pub accuracy: f64,
}

impl PerformanceRecord {
    pub(crate) fn evaluate(
        record_id: RecordId,
        pending: &PendingEvaluation,
        realized: f64,
        evaluated_at: Timestamp,
    ) -> Self {
        let forecast = &pending.forecast;
        let forecast_error = relative_error(forecast.predicted, realized);
        let realized_return = if forecast.reference.abs() > f64::EPSILON {
            (realized - forecast.reference) / forecast.reference
        } else {
            0.0
        };
        let direction_correct = forecast
            .recommendation
            .map(Recommendation::direction)
            .filter(|d| *d != 0.0)
            .map(|d| d * realized_return > 0.0);

        Self {
            record_id,
            action_id: pending.action_id,
            analyst_id: pending.analyst_id,
            idea_id: pending.idea_id,
            security_id: pending.security_id.clone(),
            action_type: pending.action_type,
            issued_at: pending.issued_at,
            evaluated_at,
            horizon_days: pending.horizon_days,
            field: forecast.field,
            predicted: forecast.predicted,
            realized,
            reference: forecast.reference,
            forecast_error,
            realized_return,
            direction_correct,
            accuracy: (1.0 - forecast_error).max(0.0),
        }
    }
}

fn relative_error(predicted: f64, realized: f64) -> f64 {
    if realized.abs() > f64::EPSILON {
        (predicted - realized).abs() / realized.abs()
    } else {
        (predicted - realized).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn pending(predicted: f64, reference: f64, rec: Recommendation) -> PendingEvaluation {
        let issued_at = Utc.with_ymd_and_hms(2023, 1, 3, 16, 0, 0).unwrap();
        PendingEvaluation {
            action_id: ActionId(1),
            analyst_id: AnalystId(1),
            idea_id: IdeaId::new(AnalystId(1), 1),
            security_id: "SEC001".into(),
            action_type: ActionType::TargetPriceRevision,
            issued_at,
            due_at: issued_at + Duration::days(90),
            horizon_days: 90,
            forecast: Forecast::new(Field::Price, predicted, reference).with_recommendation(rec),
        }
    }

    #[test]
    fn test_record_metrics() {
        let p = pending(110.0, 100.0, Recommendation::Buy);
        let record = PerformanceRecord::evaluate(RecordId(1), &p, 100.0, p.due_at);
        assert!((record.forecast_error - 0.10).abs() < 1e-12);
        assert!((record.accuracy - 0.90).abs() < 1e-12);
        assert_eq!(record.realized_return, 0.0);
        assert_eq!(record.direction_correct, Some(false));
    }

    #[test]
    fn test_hold_has_no_direction() {
        let p = pending(100.0, 100.0, Recommendation::Hold);
        let record = PerformanceRecord::evaluate(RecordId(1), &p, 120.0, p.due_at);
        assert_eq!(record.direction_correct, None);
        assert!((record.realized_return - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_floored_at_zero() {
        let p = pending(400.0, 100.0, Recommendation::StrongBuy);
        let record = PerformanceRecord::evaluate(RecordId(1), &p, 100.0, p.due_at);
        assert_eq!(record.accuracy, 0.0);
    }
}
