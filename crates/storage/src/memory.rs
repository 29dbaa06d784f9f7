//! In-memory sink for tests and embedding.

use parking_lot::Mutex;
use performance::PerformanceRecord;
use simulation::{HookContext, Incident, ResearchAction, RunSummary, SimulationHook};

#[derive(Default)]
pub struct MemorySink {
    actions: Mutex<Vec<ResearchAction>>,
    records: Mutex<Vec<PerformanceRecord>>,
    incidents: Mutex<Vec<Incident>>,
    summary: Mutex<Option<RunSummary>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<ResearchAction> {
        self.actions.lock().clone()
    }

    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.records.lock().clone()
    }

    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.lock().clone()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().clone()
    }

    pub fn action_count(&self) -> usize {
        self.actions.lock().len()
    }
}

impl SimulationHook for MemorySink {
    fn name(&self) -> &str {
        "MemorySink"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        self.actions.lock().extend(actions);
    }

    fn on_records(&self, records: Vec<PerformanceRecord>, _ctx: &HookContext) {
        self.records.lock().extend(records);
    }

    fn on_incidents(&self, incidents: Vec<Incident>, _ctx: &HookContext) {
        self.incidents.lock().extend(incidents);
    }

    fn on_simulation_end(&self, summary: &RunSummary) {
        *self.summary.lock() = Some(summary.clone());
    }
}
