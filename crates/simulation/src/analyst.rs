//! Analyst instances: immutable profile, shared archetype, exclusive state.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use archetypes::{ArchetypeDefinition, InteractionEffects, InteractionInputs};
use behaviors::productivity::BUDGET_WINDOW_DAYS;
use chrono::{Duration, NaiveDate};
use lifecycle::{Idea, LifecyclePolicy, StageChange};
use performance::{FeedbackConfig, RollingPerformance};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use types::{ActionId, AnalystId, IdeaId, IdeaStage, SecurityId, Sector, Timestamp};

use crate::incident::CapacityViolation;

// =============================================================================
// AnalystProfile
// =============================================================================

/// Static identity of an analyst. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystProfile {
    pub id: AnalystId,
    pub name: String,
    /// Name of the archetype the analyst was built from.
    pub archetype: String,
    pub start_date: NaiveDate,
    pub years_experience: f64,
    /// Distinct sectors of the coverage universe, sorted.
    pub primary_sectors: Vec<Sector>,
    /// Securities the analyst may research, sorted.
    pub coverage_universe: Vec<SecurityId>,
}

impl AnalystProfile {
    pub fn covers(&self, security: &str) -> bool {
        self.coverage_universe
            .binary_search_by(|s| s.as_str().cmp(security))
            .is_ok()
    }
}

// =============================================================================
// AnalystState
// =============================================================================

/// Mutable per-analyst state. Owned by exactly one [`AnalystInstance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystState {
    open_ideas: BTreeMap<SecurityId, Idea>,
    closed_ideas: Vec<Idea>,
    next_idea_seq: u32,
    recent_actions: VecDeque<Timestamp>,
    last_action_at: Option<Timestamp>,
    last_relevant_at: Option<Timestamp>,
    targets: BTreeMap<SecurityId, f64>,
    actions_emitted: u64,
    ideas_opened: u64,
    performance: RollingPerformance,
}

impl AnalystState {
    pub fn new(feedback: FeedbackConfig) -> Self {
        Self {
            open_ideas: BTreeMap::new(),
            closed_ideas: Vec::new(),
            next_idea_seq: 1,
            recent_actions: VecDeque::new(),
            last_action_at: None,
            last_relevant_at: None,
            targets: BTreeMap::new(),
            actions_emitted: 0,
            ideas_opened: 0,
            performance: RollingPerformance::new(feedback),
        }
    }

    /// Number of open (non-terminal) ideas.
    pub fn active_ideas(&self) -> usize {
        self.open_ideas.len()
    }

    pub fn open_ideas(&self) -> impl Iterator<Item = &Idea> {
        self.open_ideas.values()
    }

    pub fn closed_ideas(&self) -> &[Idea] {
        &self.closed_ideas
    }

    pub fn idea(&self, security: &str) -> Option<&Idea> {
        self.open_ideas.get(security)
    }

    pub fn ideas_opened(&self) -> u64 {
        self.ideas_opened
    }

    pub fn actions_emitted(&self) -> u64 {
        self.actions_emitted
    }

    pub fn last_action_at(&self) -> Option<Timestamp> {
        self.last_action_at
    }

    /// Most recent relevant event or action.
    pub fn last_activity(&self) -> Option<Timestamp> {
        self.last_action_at.max(self.last_relevant_at)
    }

    /// Latest published target for a security.
    pub fn target(&self, security: &str) -> Option<f64> {
        self.targets.get(security).copied()
    }

    pub fn performance(&self) -> &RollingPerformance {
        &self.performance
    }

    pub(crate) fn performance_mut(&mut self) -> &mut RollingPerformance {
        &mut self.performance
    }

    /// Actions in the trailing budget window ending at `now`. An action
    /// exactly one window old has expired, matching `TimedWindow`.
    pub fn recent_action_count(&self, now: Timestamp) -> usize {
        let cutoff = now - types::time::days(BUDGET_WINDOW_DAYS);
        self.recent_actions.iter().filter(|t| **t > cutoff).count()
    }

    /// Open a new idea, enforcing the coverage capacity bound.
    pub(crate) fn open_idea(
        &mut self,
        analyst: AnalystId,
        security: &str,
        at: Timestamp,
        min_duration: Duration,
        max_active: usize,
    ) -> Result<IdeaId, CapacityViolation> {
        if self.open_ideas.len() >= max_active {
            return Err(CapacityViolation {
                analyst,
                security: security.to_string(),
                at,
                active: self.open_ideas.len(),
                max: max_active,
            });
        }
        let id = IdeaId::new(analyst, self.next_idea_seq);
        self.next_idea_seq += 1;
        self.ideas_opened += 1;
        self.open_ideas
            .insert(security.to_string(), Idea::open(id, security, at, min_duration));
        Ok(id)
    }

    /// Move an open idea; terminal ideas leave the open set.
    pub(crate) fn transition(
        &mut self,
        security: &str,
        to: IdeaStage,
        at: Timestamp,
        action: Option<ActionId>,
        next_min: Duration,
        policy: &LifecyclePolicy,
    ) -> Option<lifecycle::Result<StageChange>> {
        let idea = self.open_ideas.get_mut(security)?;
        let result = idea
            .transition(to, at, action, next_min, policy)
            .map(|change| change.clone());
        if result.is_ok()
            && to.is_terminal()
            && let Some(closed) = self.open_ideas.remove(security)
        {
            self.closed_ideas.push(closed);
        }
        Some(result)
    }

    pub(crate) fn record_action(&mut self, at: Timestamp) {
        let cutoff = at - types::time::days(BUDGET_WINDOW_DAYS);
        while self.recent_actions.front().is_some_and(|t| *t <= cutoff) {
            self.recent_actions.pop_front();
        }
        self.recent_actions.push_back(at);
        self.last_action_at = Some(at);
        self.actions_emitted += 1;
    }

    pub(crate) fn mark_relevant(&mut self, at: Timestamp) {
        self.last_relevant_at = Some(at);
    }

    pub(crate) fn set_target(&mut self, security: &str, target: f64) {
        self.targets.insert(security.to_string(), target);
    }
}

// =============================================================================
// AnalystInstance
// =============================================================================

/// Profile + shared archetype + exclusively owned state and RNG.
#[derive(Debug, Clone)]
pub struct AnalystInstance {
    profile: AnalystProfile,
    archetype: Arc<ArchetypeDefinition>,
    state: AnalystState,
    rng: StdRng,
}

impl AnalystInstance {
    /// Build an instance with an RNG derived from `run_seed` and the analyst id.
    pub fn new(
        profile: AnalystProfile,
        archetype: Arc<ArchetypeDefinition>,
        feedback: FeedbackConfig,
        run_seed: u64,
    ) -> Self {
        let rng = StdRng::seed_from_u64(analyst_seed(run_seed, profile.id));
        Self {
            profile,
            archetype,
            state: AnalystState::new(feedback),
            rng,
        }
    }

    pub fn id(&self) -> AnalystId {
        self.profile.id
    }

    pub fn profile(&self) -> &AnalystProfile {
        &self.profile
    }

    pub fn archetype(&self) -> &ArchetypeDefinition {
        &self.archetype
    }

    pub fn archetype_handle(&self) -> &Arc<ArchetypeDefinition> {
        &self.archetype
    }

    pub fn state(&self) -> &AnalystState {
        &self.state
    }

    pub fn covers(&self, security: &str) -> bool {
        self.profile.covers(security)
    }

    /// Interaction effects given the analyst's current confidence and load.
    pub fn effects(&self, now: Timestamp) -> InteractionEffects {
        let recent = self.state.recent_action_count(now);
        self.archetype.effects(InteractionInputs {
            confidence: self.state.performance().confidence(),
            workload: self.archetype.productivity().workload(recent),
        })
    }

    pub(crate) fn parts_mut(&mut self) -> (&ArchetypeDefinition, &mut AnalystState, &mut StdRng) {
        (self.archetype.as_ref(), &mut self.state, &mut self.rng)
    }

    pub(crate) fn state_mut(&mut self) -> &mut AnalystState {
        &mut self.state
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Per-analyst seed: decorrelated from neighbouring ids, stable across runs.
pub fn analyst_seed(run_seed: u64, id: AnalystId) -> u64 {
    run_seed ^ id.0.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2023, 1, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_capacity_bound() {
        let mut state = AnalystState::new(FeedbackConfig::default());
        let a = AnalystId(1);
        state.open_idea(a, "A", t(1), Duration::zero(), 2).unwrap();
        state.open_idea(a, "B", t(1), Duration::zero(), 2).unwrap();
        let err = state.open_idea(a, "C", t(2), Duration::zero(), 2).unwrap_err();
        assert_eq!(err.active, 2);
        assert_eq!(state.active_ideas(), 2);
    }

    #[test]
    fn test_terminal_idea_frees_capacity() {
        let policy = LifecyclePolicy::default();
        let mut state = AnalystState::new(FeedbackConfig::default());
        let a = AnalystId(1);
        let id = state.open_idea(a, "A", t(1), Duration::zero(), 1).unwrap();
        assert_eq!(id, IdeaId::new(a, 1));
        state
            .transition("A", IdeaStage::Wip, t(2), None, Duration::zero(), &policy)
            .unwrap()
            .unwrap();
        state
            .transition("A", IdeaStage::Pass, t(3), None, Duration::zero(), &policy)
            .unwrap()
            .unwrap();
        assert_eq!(state.active_ideas(), 0);
        assert_eq!(state.closed_ideas().len(), 1);
        let next = state.open_idea(a, "B", t(4), Duration::zero(), 1).unwrap();
        assert_eq!(next.seq, 2);
    }

    #[test]
    fn test_budget_window() {
        let mut state = AnalystState::new(FeedbackConfig::default());
        state.record_action(t(1));
        state.record_action(t(2));
        assert_eq!(state.recent_action_count(t(3)), 2);

        // An action exactly one window old no longer counts.
        assert_eq!(state.recent_action_count(t(31)), 1);
        assert_eq!(state.recent_action_count(t(1) + Duration::days(31)), 0);

        state.record_action(t(31));
        assert_eq!(state.recent_action_count(t(31)), 2);
    }

    #[test]
    fn test_analyst_seeds_differ() {
        assert_ne!(analyst_seed(1, AnalystId(1)), analyst_seed(1, AnalystId(2)));
        assert_eq!(analyst_seed(9, AnalystId(3)), analyst_seed(9, AnalystId(3)));
    }
}
