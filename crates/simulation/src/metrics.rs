//! MetricsHook - built-in hook aggregating run statistics.
//!
//! Counts actions, evaluations, and incidents as they are emitted.
//! Useful for progress reporting and post-run checks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use performance::PerformanceRecord;
use types::ActionType;

use crate::action::ResearchAction;
use crate::hooks::{HookContext, SimulationHook};
use crate::incident::Incident;
use crate::runner::TickStats;

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub total_ticks: u64,
    pub total_actions: u64,
    pub total_records: u64,
    pub total_incidents: u64,
    pub avg_actions_per_tick: f64,
    pub peak_actions_per_tick: u64,
    pub actions_by_type: BTreeMap<ActionType, u64>,
    /// Mean relative forecast error over evaluated records.
    pub mean_forecast_error: Option<f64>,
}

/// Built-in hook for collecting run metrics.
///
/// Thread-safe via atomics and mutexes for interior mutability.
pub struct MetricsHook {
    tick_count: AtomicU64,
    action_count: AtomicU64,
    record_count: AtomicU64,
    incident_count: AtomicU64,
    peak_actions: AtomicU64,
    by_type: Mutex<BTreeMap<ActionType, u64>>,
    error_sum: Mutex<f64>,
    /// Per-tick action counts, bounded by `max_history`.
    action_history: Mutex<Vec<u64>>,
    max_history: usize,
}

impl MetricsHook {
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            action_count: AtomicU64::new(0),
            record_count: AtomicU64::new(0),
            incident_count: AtomicU64::new(0),
            peak_actions: AtomicU64::new(0),
            by_type: Mutex::new(BTreeMap::new()),
            error_sum: Mutex::new(0.0),
            action_history: Mutex::new(Vec::with_capacity(max_history.min(10_000))),
            max_history,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_ticks = self.tick_count.load(Ordering::Relaxed);
        let total_actions = self.action_count.load(Ordering::Relaxed);
        let total_records = self.record_count.load(Ordering::Relaxed);

        let avg_actions = if total_ticks > 0 {
            total_actions as f64 / total_ticks as f64
        } else {
            0.0
        };
        let mean_error =
            (total_records > 0).then(|| *self.error_sum.lock() / total_records as f64);

        MetricsSnapshot {
            total_ticks,
            total_actions,
            total_records,
            total_incidents: self.incident_count.load(Ordering::Relaxed),
            avg_actions_per_tick: avg_actions,
            peak_actions_per_tick: self.peak_actions.load(Ordering::Relaxed),
            actions_by_type: self.by_type.lock().clone(),
            mean_forecast_error: mean_error,
        }
    }

    pub fn action_history(&self) -> Vec<u64> {
        self.action_history.lock().clone()
    }

    pub fn reset(&self) {
        self.tick_count.store(0, Ordering::Relaxed);
        self.action_count.store(0, Ordering::Relaxed);
        self.record_count.store(0, Ordering::Relaxed);
        self.incident_count.store(0, Ordering::Relaxed);
        self.peak_actions.store(0, Ordering::Relaxed);
        self.by_type.lock().clear();
        *self.error_sum.lock() = 0.0;
        self.action_history.lock().clear();
    }

    /// Update peak value atomically (CAS loop).
    fn update_peak(peak: &AtomicU64, value: u64) {
        let mut current = peak.load(Ordering::Relaxed);
        while value > current {
            match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for MetricsHook {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationHook for MetricsHook {
    fn name(&self) -> &str {
        "Metrics"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        let count = actions.len() as u64;
        self.action_count.fetch_add(count, Ordering::Relaxed);
        Self::update_peak(&self.peak_actions, count);

        let mut by_type = self.by_type.lock();
        for action in &actions {
            *by_type.entry(action.action_type).or_insert(0) += 1;
        }
    }

    fn on_records(&self, records: Vec<PerformanceRecord>, _ctx: &HookContext) {
        self.record_count
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        *self.error_sum.lock() += records.iter().map(|r| r.forecast_error).sum::<f64>();
    }

    fn on_incidents(&self, incidents: Vec<Incident>, _ctx: &HookContext) {
        self.incident_count
            .fetch_add(incidents.len() as u64, Ordering::Relaxed);
    }

    fn on_tick_end(&self, stats: &TickStats, _ctx: &HookContext) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        let mut history = self.action_history.lock();
        if history.len() < self.max_history {
            history.push(stats.actions as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ContentPayload;
    use crate::hooks::HookRunner;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use types::{ActionId, AnalystId, ContentType, IdeaId, IdeaStage};

    fn action(id: u64, action_type: ActionType) -> ResearchAction {
        ResearchAction {
            action_id: ActionId(id),
            analyst_id: AnalystId(1),
            security_id: "SEC001".into(),
            idea_id: IdeaId::new(AnalystId(1), 1),
            action_type,
            timestamp: Utc.with_ymd_and_hms(2022, 1, 3, 12, 0, 0).unwrap(),
            content_payload: ContentPayload::new(ContentType::QuickUpdate, IdeaStage::Active),
            confidence: 0.5,
        }
    }

    #[test]
    fn test_metrics_hook_counts() {
        let metrics = Arc::new(MetricsHook::new());
        let mut runner = HookRunner::new();
        runner.add(metrics.clone());

        let ctx = HookContext::new(1, Utc.with_ymd_and_hms(2022, 1, 3, 12, 0, 0).unwrap());
        runner.on_actions(
            &[
                action(1, ActionType::NewIdea),
                action(2, ActionType::Update),
                action(3, ActionType::Update),
            ],
            &ctx,
        );
        runner.on_tick_end(
            &TickStats {
                actions: 3,
                ..Default::default()
            },
            &ctx,
        );
        runner.on_actions(&[action(4, ActionType::Exit)], &ctx);
        runner.on_tick_end(
            &TickStats {
                actions: 1,
                ..Default::default()
            },
            &ctx,
        );

        let snap = metrics.snapshot();
        assert_eq!(snap.total_ticks, 2);
        assert_eq!(snap.total_actions, 4);
        assert_eq!(snap.peak_actions_per_tick, 3);
        assert_eq!(snap.actions_by_type.get(&ActionType::Update), Some(&2));
        assert!((snap.avg_actions_per_tick - 2.0).abs() < 1e-9);
        assert!(snap.mean_forecast_error.is_none());
        assert_eq!(metrics.action_history(), vec![3, 1]);
    }

    #[test]
    fn test_reset() {
        let metrics = MetricsHook::new();
        let ctx = HookContext::new(1, Utc.with_ymd_and_hms(2022, 1, 3, 12, 0, 0).unwrap());
        metrics.on_actions(vec![action(1, ActionType::NewIdea)], &ctx);
        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.total_actions, 0);
        assert!(snap.actions_by_type.is_empty());
    }
}
