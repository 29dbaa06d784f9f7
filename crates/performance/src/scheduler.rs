//! Idempotent outcome scheduler.
//!
//! Pending evaluations are kept ordered by `(due_at, analyst, action)` so
//! that draining due work is deterministic. Each `(action, horizon)` pair is
//! remembered once evaluated; a second evaluation is a no-op.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Duration;
use types::{ActionId, AnalystId, RecordId, Timestamp};

use crate::error::{PerformanceError, Result};
use crate::record::{PendingEvaluation, PerformanceRecord};

type DueKey = (Timestamp, AnalystId, ActionId, u32);

/// Result of draining every evaluation due at a point in time.
#[derive(Debug, Default)]
pub struct EvaluationBatch {
    /// New records, in due order.
    pub records: Vec<PerformanceRecord>,
    /// Evaluations whose realized value was unavailable.
    pub gaps: Vec<PendingEvaluation>,
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeScheduler {
    pending: BTreeMap<DueKey, PendingEvaluation>,
    evaluated: BTreeSet<(ActionId, u32)>,
    records: Vec<PerformanceRecord>,
    next_record_id: u64,
}

impl OutcomeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `pending`. Its `due_at` is derived from `issued_at` and the horizon.
    pub fn schedule(&mut self, mut pending: PendingEvaluation) -> Result<()> {
        let pair = (pending.action_id, pending.horizon_days);
        let key = (
            pending.issued_at + Duration::days(i64::from(pending.horizon_days)),
            pending.analyst_id,
            pending.action_id,
            pending.horizon_days,
        );
        if self.evaluated.contains(&pair) || self.pending.contains_key(&key) {
            return Err(PerformanceError::AlreadyScheduled {
                action: pending.action_id,
                horizon_days: pending.horizon_days,
            });
        }
        pending.due_at = key.0;
        self.pending.insert(key, pending);
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingEvaluation> {
        self.pending.values()
    }

    /// Earliest due time among pending evaluations.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.pending.keys().next().map(|k| k.0)
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn is_evaluated(&self, action: ActionId, horizon_days: u32) -> bool {
        self.evaluated.contains(&(action, horizon_days))
    }

    /// Evaluate one forecast against its realized value.
    ///
    /// Returns `Ok(None)` if this `(action, horizon)` has already produced a
    /// record. Evaluating before the horizon has elapsed is an error and
    /// leaves the scheduler untouched.
    pub fn evaluate(
        &mut self,
        pending: &PendingEvaluation,
        realized: f64,
        now: Timestamp,
    ) -> Result<Option<PerformanceRecord>> {
        if now < pending.due_at {
            return Err(PerformanceError::NotDue {
                action: pending.action_id,
                horizon_days: pending.horizon_days,
                due_at: pending.due_at,
                now,
            });
        }
        if !realized.is_finite() {
            return Err(PerformanceError::InvalidOutcome {
                action: pending.action_id,
                value: realized,
            });
        }
        if !self
            .evaluated
            .insert((pending.action_id, pending.horizon_days))
        {
            return Ok(None);
        }
        self.pending.remove(&(
            pending.due_at,
            pending.analyst_id,
            pending.action_id,
            pending.horizon_days,
        ));

        self.next_record_id += 1;
        let record =
            PerformanceRecord::evaluate(RecordId(self.next_record_id), pending, realized, now);
        self.records.push(record.clone());
        Ok(Some(record))
    }

    /// Evaluate everything due at or before `now`.
    ///
    /// `realized` looks up the outcome for a pending evaluation; `None`
    /// marks a data gap and the evaluation is dropped into
    /// [`EvaluationBatch::gaps`] without producing a record.
    pub fn evaluate_due<F>(&mut self, now: Timestamp, mut realized: F) -> EvaluationBatch
    where
        F: FnMut(&PendingEvaluation) -> Option<f64>,
    {
        let mut batch = EvaluationBatch::default();
        let due: Vec<DueKey> = self
            .pending
            .range(..=(now, AnalystId(u64::MAX), ActionId(u64::MAX), u32::MAX))
            .map(|(k, _)| *k)
            .collect();

        for key in due {
            let Some(pending) = self.pending.remove(&key) else {
                continue;
            };
            match realized(&pending).filter(|v| v.is_finite()) {
                Some(value) => {
                    if let Ok(Some(record)) = self.evaluate(&pending, value, now) {
                        batch.records.push(record);
                    }
                }
                None => {
                    self.evaluated
                        .insert((pending.action_id, pending.horizon_days));
                    batch.gaps.push(pending);
                }
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Forecast;
    use chrono::TimeZone;
    use chrono::Utc;
    use types::{ActionType, Field, IdeaId};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2023, 1, 2, 16, 0, 0).unwrap()
    }

    fn pending(action: u64, analyst: u64, horizon_days: u32) -> PendingEvaluation {
        PendingEvaluation {
            action_id: ActionId(action),
            analyst_id: AnalystId(analyst),
            idea_id: IdeaId::new(AnalystId(analyst), 1),
            security_id: "SEC001".into(),
            action_type: ActionType::TargetPriceRevision,
            issued_at: t0(),
            due_at: t0(),
            horizon_days,
            forecast: Forecast::new(Field::Price, 105.0, 100.0),
        }
    }

    #[test]
    fn test_schedule_sets_due_time() {
        let mut scheduler = OutcomeScheduler::new();
        scheduler.schedule(pending(1, 1, 90)).unwrap();
        assert_eq!(scheduler.next_due(), Some(t0() + Duration::days(90)));
        assert!(matches!(
            scheduler.schedule(pending(1, 1, 90)),
            Err(PerformanceError::AlreadyScheduled { .. })
        ));
    }

    #[test]
    fn test_not_due_is_rejected() {
        let mut scheduler = OutcomeScheduler::new();
        scheduler.schedule(pending(1, 1, 90)).unwrap();
        let p = scheduler.pending().next().cloned().unwrap();
        let early = p.due_at - Duration::seconds(1);
        assert!(matches!(
            scheduler.evaluate(&p, 100.0, early),
            Err(PerformanceError::NotDue { .. })
        ));
        assert_eq!(scheduler.pending_len(), 1);
        assert!(scheduler.records().is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut scheduler = OutcomeScheduler::new();
        scheduler.schedule(pending(7, 2, 60)).unwrap();
        let p = scheduler.pending().next().cloned().unwrap();

        let first = scheduler.evaluate(&p, 100.0, p.due_at).unwrap();
        let second = scheduler.evaluate(&p, 100.0, p.due_at).unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(scheduler.records().len(), 1);
        assert!(scheduler.is_evaluated(ActionId(7), 60));

        // A drained evaluation cannot be rescheduled either.
        assert!(scheduler.schedule(pending(7, 2, 60)).is_err());
    }

    #[test]
    fn test_evaluate_due_orders_and_reports_gaps() {
        let mut scheduler = OutcomeScheduler::new();
        scheduler.schedule(pending(3, 2, 30)).unwrap();
        scheduler.schedule(pending(1, 1, 30)).unwrap();
        scheduler.schedule(pending(2, 1, 90)).unwrap();

        let now = t0() + Duration::days(30);
        let batch = scheduler.evaluate_due(now, |p| {
            (p.analyst_id == AnalystId(1)).then_some(100.0)
        });
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].action_id, ActionId(1));
        assert_eq!(batch.gaps.len(), 1);
        assert_eq!(batch.gaps[0].action_id, ActionId(3));
        assert_eq!(scheduler.pending_len(), 1);

        let again = scheduler.evaluate_due(now, |_| Some(100.0));
        assert!(again.records.is_empty());
        assert!(again.gaps.is_empty());
    }
}
