//! Discrete-event runner.
//!
//! One global timeline is merged from four sources: the event feed cursor,
//! pending analyst actions, due performance evaluations, and periodic review
//! ticks. Each call to [`Simulation::step`] advances to the earliest of them
//! and processes one full tick:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ step(now)                                                          │
//! │   1. hooks.on_tick_start                                           │
//! │   2. close due evaluations → rolling performance (EWMA, streaks)   │
//! │   3. commit consensus → snapshot shared by every analyst (barrier) │
//! │   4. events at `now`: relevance scan (parallel), timing draws      │
//! │      (sequential, analyst-id order) → pending actions              │
//! │   5. periodic review: catch-up checks for silent analysts          │
//! │   6. resolve due pending actions in (due, security, analyst) order │
//! │   7. hooks: records, actions, incidents, tick end                  │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything random flows through per-analyst RNGs and every collection
//! iterated during a tick is ordered, so two runs with identical inputs
//! emit byte-identical action logs.

use std::collections::BTreeMap;
use std::sync::Arc;

use archetypes::ArchetypeDefinition;
use chrono::Duration;
use feed::{EventFeed, MarketDataProvider};
use performance::OutcomeScheduler;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use types::{ActionId, ActionType, AnalystId, EventId, IdeaStage, SecurityId, Timestamp};

use crate::action::ResearchAction;
use crate::analyst::AnalystInstance;
use crate::checkpoint::{self, Checkpoint};
use crate::config::SimulationConfig;
use crate::consensus::{ConsensusBook, ConsensusSnapshot};
use crate::decision::{self, DecisionContext, PendingAction, Trigger};
use crate::error::{ReproducibilityError, Result};
use crate::factory::{self, PopulationEntry, PopulationSpec};
use crate::hooks::{HookContext, HookRunner, SimulationHook};
use crate::incident::{DataGapError, Incident};
use crate::parallel;
use crate::summary::{AnalystSummary, RunSummary};

/// Pending actions resolve in `(due, security, analyst)` order; `seq` keeps
/// keys unique.
type PendingKey = (Timestamp, SecurityId, AnalystId, u64);

/// Counts for one processed tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    pub timestamp: Timestamp,
    pub events: usize,
    pub actions: usize,
    pub records: usize,
    pub incidents: usize,
    pub pending_actions: usize,
    pub pending_evaluations: usize,
}

/// When an analyst first acted on an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Response {
    pub analyst: AnalystId,
    pub at: Timestamp,
}

pub struct Simulation {
    config: SimulationConfig,
    feed: Arc<EventFeed>,
    provider: Arc<dyn MarketDataProvider>,
    population: Vec<PopulationSpec>,
    analysts: Vec<AnalystInstance>,
    fingerprint: String,

    pending: BTreeMap<PendingKey, PendingAction>,
    pending_seq: u64,
    scheduler: OutcomeScheduler,
    consensus: ConsensusBook,
    snapshot: ConsensusSnapshot,

    cursor: usize,
    next_review: Timestamp,
    tick: u64,
    now: Option<Timestamp>,
    finished: bool,

    next_action_id: u64,
    actions_by_type: BTreeMap<ActionType, u64>,
    incidents: Vec<Incident>,
    responses: BTreeMap<EventId, Vec<Response>>,
    log_hasher: Sha256,

    hooks: HookRunner,
}

impl Simulation {
    /// Build a simulation: validate the config, spawn the population, and
    /// fingerprint every input.
    pub fn new(
        config: SimulationConfig,
        feed: impl Into<Arc<EventFeed>>,
        provider: Arc<dyn MarketDataProvider>,
        population: &[PopulationEntry],
    ) -> Result<Self> {
        config.validate()?;
        let feed = feed.into();
        let analysts = factory::spawn_population(population, provider.as_ref(), &config)?;

        let specs: Vec<PopulationSpec> = population.iter().map(PopulationSpec::from).collect();
        let definitions: Vec<&ArchetypeDefinition> =
            population.iter().map(|e| e.archetype.as_ref()).collect();
        let fingerprint =
            checkpoint::fingerprint(&config, &definitions, &specs, feed.events())?;

        let start = config.start_time();
        let cursor = feed.position_at(start);
        let next_review = start + Duration::days(config.review_interval_days);

        Ok(Self {
            config,
            feed,
            provider,
            population: specs,
            analysts,
            fingerprint,
            pending: BTreeMap::new(),
            pending_seq: 0,
            scheduler: OutcomeScheduler::new(),
            consensus: ConsensusBook::new(),
            snapshot: ConsensusSnapshot::default(),
            cursor,
            next_review,
            tick: 0,
            now: None,
            finished: false,
            next_action_id: 1,
            actions_by_type: BTreeMap::new(),
            incidents: Vec::new(),
            responses: BTreeMap::new(),
            log_hasher: Sha256::new(),
            hooks: HookRunner::new(),
        })
    }

    /// Register a hook. Hooks are called in registration order.
    pub fn add_hook(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.add(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Timestamp of the last processed tick.
    pub fn now(&self) -> Option<Timestamp> {
        self.now
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn population(&self) -> &[PopulationSpec] {
        &self.population
    }

    pub fn analysts(&self) -> &[AnalystInstance] {
        &self.analysts
    }

    pub fn analyst(&self, id: AnalystId) -> Option<&AnalystInstance> {
        self.index_of(id).map(|i| &self.analysts[i])
    }

    pub fn scheduler(&self) -> &OutcomeScheduler {
        &self.scheduler
    }

    pub fn consensus(&self) -> &ConsensusSnapshot {
        &self.snapshot
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn actions_emitted(&self) -> u64 {
        self.next_action_id - 1
    }

    /// First response of each analyst to each event, in response order.
    pub fn responses(&self) -> &BTreeMap<EventId, Vec<Response>> {
        &self.responses
    }

    pub fn pending_actions(&self) -> usize {
        self.pending.len()
    }

    /// SHA-256 over every action emitted so far.
    pub fn action_log_hash(&self) -> String {
        hex::encode(self.log_hasher.clone().finalize())
    }

    fn index_of(&self, id: AnalystId) -> Option<usize> {
        self.analysts.binary_search_by_key(&id, |a| a.id()).ok()
    }

    fn push_pending(&mut self, pending: PendingAction) {
        if pending.due > self.config.end_time() {
            return;
        }
        self.pending_seq += 1;
        let key = (
            pending.due,
            pending.security.clone(),
            pending.analyst,
            self.pending_seq,
        );
        self.pending.insert(key, pending);
    }

    /// Earliest timestamp any source needs processed, within the run window.
    fn next_tick_time(&self) -> Option<Timestamp> {
        let end = self.config.end_time();
        [
            self.feed.get(self.cursor).map(|e| e.timestamp),
            self.pending.keys().next().map(|k| k.0),
            self.scheduler.next_due(),
            Some(self.next_review),
        ]
        .into_iter()
        .flatten()
        .filter(|t| *t <= end)
        .min()
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Process one tick. Returns `None` once the run window is exhausted.
    pub fn step(&mut self) -> Result<Option<TickStats>> {
        if self.finished {
            return Ok(None);
        }
        let Some(now) = self.next_tick_time() else {
            self.finished = true;
            return Ok(None);
        };
        self.tick += 1;
        self.now = Some(now);
        let mut stats = TickStats {
            tick: self.tick,
            timestamp: now,
            ..Default::default()
        };
        let mut incidents = Vec::new();

        // Phase 1: Hook - tick start
        let ctx = self.hook_context(now);
        self.hooks.on_tick_start(&ctx);

        // Phase 2: Close due evaluations and feed them back
        let records = self.evaluate_due(now, &mut incidents);
        stats.records = records.len();

        // Phase 3: Consensus barrier
        self.snapshot = self.consensus.commit();

        // Phase 4: Events at `now`
        stats.events = self.dispatch_events(now);

        // Phase 5: Periodic review
        if now >= self.next_review {
            self.review(now);
            while self.next_review <= now {
                self.next_review += Duration::days(self.config.review_interval_days);
            }
        }

        // Phase 6: Resolve due pending actions
        let actions = self.resolve_due(now, &mut incidents)?;
        stats.actions = actions.len();
        stats.incidents = incidents.len();
        stats.pending_actions = self.pending.len();
        stats.pending_evaluations = self.scheduler.pending_len();
        self.incidents.extend(incidents.iter().cloned());

        // Phase 7: Hooks
        let ctx = self.hook_context(now);
        self.hooks.on_records(&records, &ctx);
        self.hooks.on_actions(&actions, &ctx);
        self.hooks.on_incidents(&incidents, &ctx);
        self.hooks.on_tick_end(&stats, &ctx);

        Ok(Some(stats))
    }

    /// Run to the end of the window and return the summary.
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(
            analysts = self.analysts.len(),
            events = self.feed.len(),
            start = %self.config.start,
            end = %self.config.end,
            seed = self.config.seed,
            "simulation started"
        );
        while self.step()?.is_some() {}
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            actions = summary.total_actions,
            records = summary.records,
            incidents = summary.incidents.len(),
            "simulation finished"
        );
        self.hooks.on_simulation_end(&summary);
        Ok(summary)
    }

    fn hook_context(&self, now: Timestamp) -> HookContext {
        HookContext::new(self.tick, now)
            .with_consensus_version(self.snapshot.version())
            .with_analysts(self.analysts.len())
            .with_pending(self.pending.len(), self.scheduler.pending_len())
    }

    fn evaluate_due(
        &mut self,
        now: Timestamp,
        incidents: &mut Vec<Incident>,
    ) -> Vec<performance::PerformanceRecord> {
        let provider = Arc::clone(&self.provider);
        let batch = self.scheduler.evaluate_due(now, |p| {
            provider.value_as_of(&p.security_id, p.forecast.field, p.due_at.date_naive())
        });

        for record in &batch.records {
            if let Some(i) = self.index_of(record.analyst_id) {
                self.analysts[i]
                    .state_mut()
                    .performance_mut()
                    .observe(record);
            }
        }
        for gap in batch.gaps {
            let incident = Incident::from(DataGapError {
                analyst: gap.analyst_id,
                security: gap.security_id,
                field: gap.forecast.field,
                as_of: gap.due_at.date_naive(),
                at: now,
                trigger: None,
            });
            debug!(%incident, "evaluation skipped");
            incidents.push(incident);
        }
        batch.records
    }

    fn dispatch_events(&mut self, now: Timestamp) -> usize {
        let feed = Arc::clone(&self.feed);
        let mut dispatched = 0;
        while let Some(event) = feed.get(self.cursor).filter(|e| e.timestamp <= now) {
            self.cursor += 1;
            dispatched += 1;

            let provider = self.provider.as_ref();
            let relevant: Vec<usize> = parallel::filter_map_slice(
                &self.analysts,
                |a| decision::is_relevant(a, event, provider).then_some(a.id()),
                self.config.force_sequential,
            )
            .into_iter()
            .filter_map(|id| self.index_of(id))
            .collect();

            for i in relevant {
                if let Some(pending) = decision::sample_response(&mut self.analysts[i], event) {
                    self.push_pending(pending);
                }
            }
        }
        dispatched
    }

    fn review(&mut self, now: Timestamp) {
        let start = self.config.start_time();
        let max_silence = self.config.max_silence_days as f64;
        let probability = self.config.catch_up_probability;
        let mut scheduled = Vec::new();
        for analyst in &mut self.analysts {
            if let Some(p) = decision::catch_up(analyst, now, start, max_silence, probability) {
                scheduled.push(p);
            }
        }
        for pending in scheduled {
            self.push_pending(pending);
        }
    }

    fn resolve_due(
        &mut self,
        now: Timestamp,
        incidents: &mut Vec<Incident>,
    ) -> Result<Vec<ResearchAction>> {
        let provider = Arc::clone(&self.provider);
        let snapshot = self.snapshot.clone();
        let horizons = self.config.horizons;
        let policy = self.config.lifecycle;
        let ctx = DecisionContext {
            now,
            consensus: &snapshot,
            provider: provider.as_ref(),
            horizons: &horizons,
            policy: &policy,
        };

        let mut actions = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let pending = entry.remove();
            let Some(i) = self.index_of(pending.analyst) else {
                continue;
            };
            let action_id = ActionId(self.next_action_id);
            let resolution = decision::resolve(&mut self.analysts[i], &pending, &ctx, action_id);

            if let Some(incident) = resolution.incident {
                debug!(%incident, "decision downgraded");
                incidents.push(incident);
            }
            if let Some(follow_up) = resolution.follow_up {
                self.push_pending(PendingAction {
                    due: follow_up.at,
                    analyst: pending.analyst,
                    security: pending.security.clone(),
                    trigger: Trigger::Review {
                        stage: follow_up.stage,
                    },
                });
            }
            let Some(action) = resolution.action else {
                continue;
            };

            self.next_action_id += 1;
            self.record_action(&action, &pending)?;
            if let Some(evaluation) = resolution.evaluation
                && let Err(e) = self.scheduler.schedule(evaluation)
            {
                warn!(error = %e, "evaluation not scheduled");
            }
            actions.push(action);
        }
        Ok(actions)
    }

    fn record_action(&mut self, action: &ResearchAction, pending: &PendingAction) -> Result<()> {
        let line = serde_json::to_vec(action)?;
        self.log_hasher.update(&line);
        self.log_hasher.update(b"\n");
        *self.actions_by_type.entry(action.action_type).or_insert(0) += 1;

        let payload = &action.content_payload;
        if payload.stage.is_terminal() {
            self.consensus
                .withdraw(&action.security_id, action.analyst_id);
        } else if let (Some(target), Some(recommendation)) =
            (payload.target_price, payload.recommendation)
        {
            self.consensus.publish(
                &action.security_id,
                action.analyst_id,
                target,
                recommendation,
            );
        }

        if let Trigger::Event { id, .. } = pending.trigger {
            let responses = self.responses.entry(id).or_default();
            if !responses.iter().any(|r| r.analyst == action.analyst_id) {
                responses.push(Response {
                    analyst: action.analyst_id,
                    at: action.timestamp,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Reporting and resume
    // =========================================================================

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        let now = self.now.unwrap_or_else(|| self.config.start_time());
        let mut ideas_opened = 0;
        let mut ideas_exited = 0;
        let mut ideas_passed = 0;
        let analysts: Vec<AnalystSummary> = self
            .analysts
            .iter()
            .map(|a| {
                let state = a.state();
                let closed = state.closed_ideas();
                let exited = closed
                    .iter()
                    .filter(|i| i.stage() == IdeaStage::Exit)
                    .count();
                let passed = closed
                    .iter()
                    .filter(|i| i.stage() == IdeaStage::Pass)
                    .count();
                ideas_opened += state.ideas_opened();
                ideas_exited += exited as u64;
                ideas_passed += passed as u64;
                AnalystSummary {
                    analyst_id: a.id(),
                    name: a.profile().name.clone(),
                    archetype: a.profile().archetype.clone(),
                    actions: state.actions_emitted(),
                    ideas_opened: state.ideas_opened(),
                    ideas_open: state.active_ideas(),
                    ideas_exited: exited,
                    ideas_passed: passed,
                    performance: state.performance().snapshot(now),
                }
            })
            .collect();

        let capacity_violations = self
            .incidents
            .iter()
            .filter(|i| matches!(i, Incident::CapacityViolation(_)))
            .count() as u64;
        let data_gaps = self.incidents.len() as u64 - capacity_violations;

        RunSummary {
            seed: self.config.seed,
            start: self.config.start,
            end: self.config.end,
            ticks: self.tick,
            total_actions: self.actions_emitted(),
            actions_by_type: self.actions_by_type.clone(),
            ideas_opened,
            ideas_exited,
            ideas_passed,
            capacity_violations,
            data_gaps,
            incidents: self.incidents.clone(),
            records: self.scheduler.records().len() as u64,
            pending_evaluations: self.scheduler.pending_len(),
            analysts,
            action_log_hash: self.action_log_hash(),
        }
    }

    /// Capture the current tick for later resume.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            fingerprint: self.fingerprint.clone(),
            tick: self.tick,
            timestamp: self.now,
            actions_emitted: self.actions_emitted(),
            action_log_hash: self.action_log_hash(),
        }
    }

    /// Replay a fresh simulation up to `checkpoint` and verify it.
    ///
    /// Hooks are muted during the replay. Fails with a
    /// [`ReproducibilityError`] when the inputs differ from the checkpointed
    /// run or the replayed action log diverges.
    pub fn resume(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        if self.tick != 0 {
            return Err(ReproducibilityError::AlreadyStarted(self.tick).into());
        }
        if checkpoint.fingerprint != self.fingerprint {
            return Err(ReproducibilityError::Fingerprint {
                expected: checkpoint.fingerprint.clone(),
                actual: self.fingerprint.clone(),
            }
            .into());
        }

        let hooks = std::mem::take(&mut self.hooks);
        let replayed = self.replay_to(checkpoint.tick);
        self.hooks = hooks;
        replayed?;

        let actual = self.action_log_hash();
        if actual != checkpoint.action_log_hash {
            return Err(ReproducibilityError::ActionLog {
                tick: checkpoint.tick,
                expected: checkpoint.action_log_hash.clone(),
                actual,
            }
            .into());
        }
        info!(tick = self.tick, "resumed from checkpoint");
        Ok(())
    }

    fn replay_to(&mut self, tick: u64) -> Result<()> {
        while self.tick < tick {
            if self.step()?.is_none() {
                return Err(ReproducibilityError::Truncated {
                    tick,
                    reached: self.tick,
                }
                .into());
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("now", &self.now)
            .field("analysts", &self.analysts.len())
            .field("pending", &self.pending.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use feed::{SyntheticMarketConfig, SyntheticMarketGenerator};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collector {
        actions: Mutex<Vec<ResearchAction>>,
        ends: Mutex<u64>,
    }

    impl SimulationHook for Collector {
        fn name(&self) -> &str {
            "Collector"
        }

        fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
            self.actions.lock().extend(actions);
        }

        fn on_simulation_end(&self, _summary: &RunSummary) {
            *self.ends.lock() += 1;
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn build(seed: u64, force_sequential: bool) -> Simulation {
        let (start, end) = (date(2022, 1, 1), date(2022, 6, 30));
        let market = SyntheticMarketGenerator::new(
            SyntheticMarketConfig::default()
                .with_dates(start, end)
                .with_securities(12),
            7,
        )
        .generate()
        .unwrap();
        let config = SimulationConfig::new(start, end)
            .with_seed(seed)
            .with_force_sequential(force_sequential);
        let population = vec![
            PopulationEntry::new(archetypes::registry::shared("Oracle").unwrap(), 2),
            PopulationEntry::new(archetypes::registry::shared("Follower").unwrap(), 2),
        ];
        Simulation::new(config, market.feed, Arc::new(market.provider), &population).unwrap()
    }

    #[test]
    fn test_run_orders_actions() {
        let mut sim = build(42, false);
        let collector = Arc::new(Collector::default());
        sim.add_hook(collector.clone());
        let summary = sim.run().unwrap();

        let actions = collector.actions.lock();
        assert!(!actions.is_empty());
        assert_eq!(actions.len() as u64, summary.total_actions);
        for (i, pair) in actions.windows(2).enumerate() {
            assert_eq!(pair[0].action_id.0, i as u64 + 1);
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert!(actions.iter().all(|a| a.timestamp <= sim.config().end_time()));
        assert_eq!(*collector.ends.lock(), 1);
        assert!(sim.is_finished());
        assert!(sim.step().unwrap().is_none());
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let a = build(42, false).run().unwrap();
        let b = build(42, true).run().unwrap();
        assert_eq!(a.action_log_hash, b.action_log_hash);
        assert_eq!(a.total_actions, b.total_actions);
    }

    #[test]
    fn test_summary_counts_match_analysts() {
        let summary = build(3, false).run().unwrap();
        let per_analyst: u64 = summary.analysts.iter().map(|a| a.actions).sum();
        assert_eq!(per_analyst, summary.total_actions);
        let by_type: u64 = summary.actions_by_type.values().sum();
        assert_eq!(by_type, summary.total_actions);
        assert_eq!(
            summary.capacity_violations + summary.data_gaps,
            summary.incidents.len() as u64
        );
    }

    #[test]
    fn test_resume_verifies_inputs() {
        let mut first = build(42, false);
        for _ in 0..20 {
            first.step().unwrap();
        }
        let checkpoint = first.checkpoint();

        let mut replay = build(42, false);
        replay.resume(&checkpoint).unwrap();
        assert_eq!(replay.tick(), 20);
        assert_eq!(replay.action_log_hash(), checkpoint.action_log_hash);

        let mut other = build(43, false);
        assert!(matches!(
            other.resume(&checkpoint),
            Err(crate::SimulationError::Reproducibility(
                ReproducibilityError::Fingerprint { .. }
            ))
        ));

        assert!(matches!(
            replay.resume(&checkpoint),
            Err(crate::SimulationError::Reproducibility(
                ReproducibilityError::AlreadyStarted(20)
            ))
        ));
    }
}
