//! Decision engine: relevance, response timing, and action resolution.
//!
//! ```text
//!   MarketEvent ──► is_relevant ──► sample_response ──► PendingAction
//!                   (read-only,      (analyst RNG)        (due = event
//!                    parallel)                             + delay)
//!                                                             │
//!   review / catch-up ────────────────────────────────────────┤
//!                                                             ▼
//!                                            resolve ──► Resolution
//!                                            (capacity, budget, lifecycle,
//!                                             forecast, bias)
//! ```
//!
//! Resolution mutates only the acting analyst's state and RNG. Consensus is
//! read from the tick's snapshot, so the outcome does not depend on which
//! other analysts acted earlier in the same tick.

use archetypes::{ArchetypeDefinition, InteractionEffects};
use behaviors::{AccuracyContext, BiasContext, distributions};
use chrono::Duration;
use feed::{MarketDataProvider, MarketEvent};
use lifecycle::{LifecycleError, LifecyclePolicy};
use performance::{Forecast, Horizons, PendingEvaluation};
use rand::Rng;
use rand::rngs::StdRng;
use types::time::days;
use types::{
    ActionId, ActionType, AnalystId, EventId, EventType, Field, IdeaId, IdeaStage,
    Recommendation, SecurityId, Sector, Timestamp,
};

use crate::action::{ContentPayload, ResearchAction, content_type_for};
use crate::analyst::{AnalystInstance, AnalystState};
use crate::consensus::ConsensusSnapshot;
use crate::incident::{CapacityViolation, DataGapError, Incident};

// =============================================================================
// Pending actions
// =============================================================================

/// Why a pending action exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Delayed response to a market event.
    Event {
        id: EventId,
        event_type: EventType,
        magnitude: f64,
    },
    /// Follow-up once an idea's minimum time in `stage` has elapsed.
    Review { stage: IdeaStage },
    /// Note from an analyst who has been silent too long.
    CatchUp,
}

impl Trigger {
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Trigger::Event { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Trigger::Event { event_type, .. } => Some(*event_type),
            _ => None,
        }
    }
}

/// An analyst decision waiting for its action time.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub due: Timestamp,
    pub analyst: AnalystId,
    pub security: SecurityId,
    pub trigger: Trigger,
}

/// Review to schedule after a stage change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowUp {
    pub at: Timestamp,
    pub stage: IdeaStage,
}

/// Why a pending action produced no research action.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The 30-day action budget is used up.
    OverBudget,
    /// The appetite draw declined a new idea.
    NoAppetite,
    /// The sector already holds its cap of open ideas.
    SectorLimit,
    /// The reviewed idea has moved on or closed.
    StaleReview,
    /// The idea has not spent its minimum time in stage.
    NotReady,
    /// An active idea was reviewed and kept as is.
    Hold,
    Lifecycle(LifecycleError),
}

/// Everything a resolved pending action produced.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub action: Option<ResearchAction>,
    pub evaluation: Option<PendingEvaluation>,
    pub follow_up: Option<FollowUp>,
    pub incident: Option<Incident>,
    pub skipped: Option<SkipReason>,
}

impl Resolution {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    fn incident(incident: Incident) -> Self {
        Self {
            incident: Some(incident),
            ..Default::default()
        }
    }

    fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

/// Read-only inputs shared by every decision in a tick.
#[derive(Clone, Copy)]
pub struct DecisionContext<'a> {
    pub now: Timestamp,
    pub consensus: &'a ConsensusSnapshot,
    pub provider: &'a dyn MarketDataProvider,
    pub horizons: &'a Horizons,
    pub policy: &'a LifecyclePolicy,
}

// =============================================================================
// Relevance and timing
// =============================================================================

/// Whether `event` is worth the analyst's attention. Pure; safe to run in parallel.
pub fn is_relevant(
    analyst: &AnalystInstance,
    event: &MarketEvent,
    provider: &dyn MarketDataProvider,
) -> bool {
    if !analyst.covers(&event.security_id) {
        return false;
    }
    let constraints = analyst.archetype().constraints();
    let sector_ok = match provider.sector(&event.security_id) {
        Some(sector) => constraints.allows_sector(sector),
        None => constraints.sector_whitelist.is_none(),
    };
    sector_ok && analyst.archetype().timing().is_relevant(event.magnitude)
}

/// Draw whether and when the analyst responds to a relevant event.
pub fn sample_response(analyst: &mut AnalystInstance, event: &MarketEvent) -> Option<PendingAction> {
    let effects = analyst.effects(event.timestamp);
    let id = analyst.id();
    let (archetype, state, rng) = analyst.parts_mut();
    state.mark_relevant(event.timestamp);
    let decision =
        archetype
            .timing()
            .sample_response(rng, event.magnitude, event.event_type, effects.delay_scale);
    decision.will_respond.then(|| PendingAction {
        due: event.timestamp + days(decision.delay_days),
        analyst: id,
        security: event.security_id.clone(),
        trigger: Trigger::Event {
            id: event.id,
            event_type: event.event_type,
            magnitude: event.magnitude,
        },
    })
}

/// Low-probability catch-up check for a silent analyst.
///
/// The silence allowed is `max_silence_days` divided by the analyst's
/// publication frequency. Picks one of the analyst's open ideas, or any
/// covered security when none is open.
pub fn catch_up(
    analyst: &mut AnalystInstance,
    now: Timestamp,
    silent_since: Timestamp,
    max_silence_days: f64,
    probability: f64,
) -> Option<PendingAction> {
    let last = analyst.state().last_activity().unwrap_or(silent_since);
    let max_silence = days(
        analyst
            .archetype()
            .timing()
            .silence_before_catch_up(max_silence_days),
    );
    if now - last < max_silence {
        return None;
    }
    let open: Vec<SecurityId> = analyst
        .state()
        .open_ideas()
        .map(|i| i.security_id().to_string())
        .collect();
    let universe = analyst.profile().coverage_universe.clone();
    let id = analyst.id();
    let rng = analyst.rng_mut();
    if !distributions::chance(rng, probability) {
        return None;
    }
    let pool = if open.is_empty() { &universe } else { &open };
    if pool.is_empty() {
        return None;
    }
    let security = pool[rng.random_range(0..pool.len())].clone();
    Some(PendingAction {
        due: now,
        analyst: id,
        security,
        trigger: Trigger::CatchUp,
    })
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a due pending action into at most one research action.
///
/// `action_id` is used only when an action is emitted.
pub fn resolve(
    analyst: &mut AnalystInstance,
    pending: &PendingAction,
    ctx: &DecisionContext<'_>,
    action_id: ActionId,
) -> Resolution {
    let effects = analyst.effects(ctx.now);
    let id = analyst.id();
    let sector = ctx.provider.sector(&pending.security);
    let (archetype, state, rng) = analyst.parts_mut();
    Resolver {
        analyst: id,
        archetype,
        state,
        rng,
        effects,
        sector,
        pending,
        ctx,
        action_id,
    }
    .run()
}

/// Values of a forecast drawn for one action.
struct Draft {
    target: f64,
    previous: Option<f64>,
    reference: f64,
    recommendation: Recommendation,
    horizon_days: u32,
    confidence: Option<f64>,
}

struct Resolver<'a, 'c> {
    analyst: AnalystId,
    archetype: &'a ArchetypeDefinition,
    state: &'a mut AnalystState,
    rng: &'a mut StdRng,
    effects: InteractionEffects,
    sector: Option<Sector>,
    pending: &'a PendingAction,
    ctx: &'a DecisionContext<'c>,
    action_id: ActionId,
}

impl Resolver<'_, '_> {
    fn run(&mut self) -> Resolution {
        let now = self.ctx.now;
        let pending = self.pending;
        let open = self
            .state
            .idea(&pending.security)
            .map(|i| (i.id(), i.stage(), i.is_ready(now)));

        match (open, &pending.trigger) {
            (None, Trigger::Review { .. }) => Resolution::skipped(SkipReason::StaleReview),
            (None, _) => self.open_new_idea(),
            (Some((_, stage, _)), Trigger::Review { stage: expected }) if stage != *expected => {
                Resolution::skipped(SkipReason::StaleReview)
            }
            (Some((idea, IdeaStage::NewIdea, true)), _) => {
                self.advance(idea, IdeaStage::NewIdea, IdeaStage::Wip)
            }
            (Some((idea, IdeaStage::Wip, true)), _) => {
                let to = if self.archetype.productivity().completes_idea(self.rng) {
                    IdeaStage::Active
                } else {
                    IdeaStage::Pass
                };
                self.advance(idea, IdeaStage::Wip, to)
            }
            (Some((idea, IdeaStage::Active, _)), Trigger::Review { .. }) => {
                let productivity = self.archetype.productivity();
                if productivity.exits_idea(self.rng) {
                    // Under the Active -> Pass policy an exit that would not
                    // have completed the idea abandons it instead.
                    let to = if self.ctx.policy.allow_active_to_pass
                        && !productivity.completes_idea(self.rng)
                    {
                        IdeaStage::Pass
                    } else {
                        IdeaStage::Exit
                    };
                    self.advance(idea, IdeaStage::Active, to)
                } else {
                    let hold = self.sample_duration(IdeaStage::Active);
                    Resolution::skipped(SkipReason::Hold).with_follow_up(FollowUp {
                        at: now + hold,
                        stage: IdeaStage::Active,
                    })
                }
            }
            (Some(_), Trigger::Review { .. }) => Resolution::skipped(SkipReason::NotReady),
            (Some((idea, IdeaStage::Active, _)), Trigger::Event { event_type, .. })
                if event_type.is_fundamental() =>
            {
                self.revise_target(idea)
            }
            (Some((idea, stage, _)), _) => self.update(idea, stage),
        }
    }

    fn within_budget(&self) -> bool {
        let recent = self.state.recent_action_count(self.ctx.now);
        self.archetype
            .productivity()
            .within_scaled_budget(recent, self.effects.publication_scale)
    }

    fn sample_duration(&mut self, stage: IdeaStage) -> Duration {
        days(self.archetype.productivity().sample_stage_duration(
            self.rng,
            stage,
            self.effects.stage_duration_scale,
        ))
    }

    fn open_new_idea(&mut self) -> Resolution {
        if !self.within_budget() {
            return Resolution::skipped(SkipReason::OverBudget);
        }
        let archetype = self.archetype;
        let coverage = archetype.coverage();
        let active = self.state.active_ideas();
        if !coverage.has_capacity(active) {
            return Resolution::incident(
                CapacityViolation {
                    analyst: self.analyst,
                    security: self.pending.security.clone(),
                    at: self.ctx.now,
                    active,
                    max: coverage.max_active_coverage(),
                }
                .into(),
            );
        }
        if let Some(sector) = self.sector {
            let provider = self.ctx.provider;
            let in_sector = self
                .state
                .open_ideas()
                .filter(|i| provider.sector(i.security_id()) == Some(sector))
                .count();
            if !coverage.within_sector_limit(in_sector) {
                return Resolution::skipped(SkipReason::SectorLimit);
            }
        }
        if !distributions::chance(self.rng, coverage.new_idea_appetite(active)) {
            return Resolution::skipped(SkipReason::NoAppetite);
        }

        let draft = match self.draft_forecast(ActionType::NewIdea) {
            Ok(draft) => draft,
            Err(gap) => return Resolution::incident(gap.into()),
        };
        let min = self.sample_duration(IdeaStage::NewIdea);
        let idea = match self.state.open_idea(
            self.analyst,
            &self.pending.security,
            self.ctx.now,
            min,
            coverage.max_active_coverage(),
        ) {
            Ok(idea) => idea,
            Err(violation) => return Resolution::incident(violation.into()),
        };
        self.emit(idea, ActionType::NewIdea, IdeaStage::NewIdea, None, draft)
            .with_follow_up(FollowUp {
                at: self.ctx.now + min,
                stage: IdeaStage::NewIdea,
            })
    }

    fn advance(&mut self, idea: IdeaId, from: IdeaStage, to: IdeaStage) -> Resolution {
        let action_type = match to {
            IdeaStage::Pass => ActionType::Pass,
            IdeaStage::Exit => ActionType::Exit,
            _ => ActionType::StageTransition,
        };
        let draft = if to == IdeaStage::Active {
            match self.draft_forecast(action_type) {
                Ok(draft) => draft,
                Err(gap) => return Resolution::incident(gap.into()),
            }
        } else {
            None
        };
        let next_min = if to.is_terminal() {
            Duration::zero()
        } else {
            self.sample_duration(to)
        };

        let now = self.ctx.now;
        match self.state.transition(
            &self.pending.security,
            to,
            now,
            Some(self.action_id),
            next_min,
            self.ctx.policy,
        ) {
            None => return Resolution::skipped(SkipReason::StaleReview),
            Some(Err(e)) => return Resolution::skipped(SkipReason::Lifecycle(e)),
            Some(Ok(_)) => {}
        }

        let resolution = self.emit(idea, action_type, to, Some(from), draft);
        if to.is_terminal() {
            resolution
        } else {
            resolution.with_follow_up(FollowUp {
                at: now + next_min,
                stage: to,
            })
        }
    }

    fn revise_target(&mut self, idea: IdeaId) -> Resolution {
        if !self.within_budget() {
            return Resolution::skipped(SkipReason::OverBudget);
        }
        match self.draft_forecast(ActionType::TargetPriceRevision) {
            Ok(draft) => self.emit(
                idea,
                ActionType::TargetPriceRevision,
                IdeaStage::Active,
                None,
                draft,
            ),
            Err(gap) => Resolution::incident(gap.into()),
        }
    }

    /// Note without a new target. Active ideas reaffirm the standing target.
    fn update(&mut self, idea: IdeaId, stage: IdeaStage) -> Resolution {
        if !self.within_budget() {
            return Resolution::skipped(SkipReason::OverBudget);
        }
        let standing = self.state.target(&self.pending.security);
        let draft = match (stage, standing, self.ctx.horizons.days_for(ActionType::Update)) {
            (IdeaStage::Active, Some(target), Some(horizon_days)) => {
                match self.price_as_of(self.ctx.now) {
                    Ok(reference) => Some(Draft {
                        target,
                        previous: Some(target),
                        reference,
                        recommendation: Recommendation::from_upside(target / reference - 1.0),
                        horizon_days,
                        confidence: None,
                    }),
                    Err(gap) => return Resolution::incident(gap.into()),
                }
            }
            _ => None,
        };
        self.emit(idea, ActionType::Update, stage, None, draft)
    }

    fn price_as_of(&self, at: Timestamp) -> Result<f64, DataGapError> {
        let as_of = at.date_naive();
        self.ctx
            .provider
            .value_as_of(&self.pending.security, Field::Price, as_of)
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| DataGapError {
                analyst: self.analyst,
                security: self.pending.security.clone(),
                field: Field::Price,
                as_of,
                at: self.ctx.now,
                trigger: self.pending.trigger.event_id(),
            })
    }

    /// Hindsight truth at the horizon, perturbed by accuracy and bent by bias.
    fn draft_forecast(&mut self, action_type: ActionType) -> Result<Option<Draft>, DataGapError> {
        let Some(horizon_days) = self.ctx.horizons.days_for(action_type) else {
            return Ok(None);
        };
        let now = self.ctx.now;
        let reference = self.price_as_of(now)?;
        let truth = self.price_as_of(now + Duration::days(i64::from(horizon_days)))?;

        let archetype = self.archetype;
        let accuracy = archetype.accuracy();
        let perturbation = accuracy.perturb(
            self.rng,
            truth,
            &AccuracyContext {
                sector: self.sector,
                horizon_days: f64::from(horizon_days),
                dampening: self.effects.accuracy_dampening,
            },
        );

        let previous = self.state.target(&self.pending.security);
        let bias_ctx = BiasContext {
            strength_scale: self.effects.bias_strength_scale,
            ..BiasContext::new(
                previous,
                self.ctx.consensus.mean_target(&self.pending.security),
                self.state.performance().confidence(),
            )
        };
        let bias = archetype.bias();
        let biased = bias.adjust(perturbation.value, &bias_ctx).max(truth * 0.01);
        let constraints = archetype.constraints();
        let target = constraints.clamp_revision(previous, biased);

        let stated = accuracy.confidence_for(self.rng, perturbation.error);
        let confidence = constraints.clamp_confidence(bias.adjust_confidence(stated));

        Ok(Some(Draft {
            target,
            previous,
            reference,
            recommendation: Recommendation::from_upside(target / reference - 1.0),
            horizon_days,
            confidence: Some(confidence),
        }))
    }

    fn emit(
        &mut self,
        idea: IdeaId,
        action_type: ActionType,
        stage: IdeaStage,
        from_stage: Option<IdeaStage>,
        draft: Option<Draft>,
    ) -> Resolution {
        let now = self.ctx.now;
        let security = self.pending.security.clone();
        let mut payload = ContentPayload::new(
            content_type_for(action_type, self.pending.trigger.event_type()),
            stage,
        );
        payload.from_stage = from_stage;
        payload.trigger = self.pending.trigger.event_id();

        let rolling = self.state.performance().confidence();
        let constraints = self.archetype.constraints();
        let mut confidence =
            constraints.clamp_confidence(self.archetype.bias().adjust_confidence(rolling));

        let mut evaluation = None;
        if let Some(draft) = draft {
            payload.recommendation = Some(draft.recommendation);
            payload.target_price = Some(draft.target);
            payload.previous_target = draft.previous;
            payload.reference_price = Some(draft.reference);
            payload.horizon_days = Some(draft.horizon_days);
            if let Some(c) = draft.confidence {
                confidence = c;
            }
            self.state.set_target(&security, draft.target);
            evaluation = Some(PendingEvaluation {
                action_id: self.action_id,
                analyst_id: self.analyst,
                idea_id: idea,
                security_id: security.clone(),
                action_type,
                issued_at: now,
                due_at: now,
                horizon_days: draft.horizon_days,
                forecast: Forecast::new(Field::Price, draft.target, draft.reference)
                    .with_recommendation(draft.recommendation),
            });
        } else if matches!(action_type, ActionType::Exit | ActionType::Pass) {
            payload.previous_target = self.state.target(&security);
        }

        self.state.record_action(now);
        Resolution {
            action: Some(ResearchAction {
                action_id: self.action_id,
                analyst_id: self.analyst,
                security_id: security,
                idea_id: idea,
                action_type,
                timestamp: now,
                content_payload: payload,
                confidence,
            }),
            evaluation,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyst::AnalystProfile;
    use crate::consensus::ConsensusBook;
    use archetypes::{ArchetypeBuilder, templates};
    use behaviors::{
        CoverageBehavior, ProductivityBehavior, ProductivityParams, TimingBehavior, TimingParams,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use feed::InMemoryProvider;
    use performance::FeedbackConfig;
    use std::sync::Arc;

    fn t(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2022, 3, day, 12, 0, 0).unwrap()
    }

    fn provider() -> InMemoryProvider {
        let mut provider = InMemoryProvider::new();
        provider.set_sector("SEC001", Sector::InformationTechnology);
        provider.set_sector("SEC002", Sector::InformationTechnology);
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        for d in 0..400 {
            let date = start + Duration::days(d);
            provider
                .insert("SEC001", Field::Price, date, 100.0 + d as f64 * 0.1)
                .unwrap();
        }
        provider
    }

    fn eager_archetype(max_active: usize) -> Arc<ArchetypeDefinition> {
        let base = templates::follower().unwrap();
        let productivity = ProductivityBehavior::new(ProductivityParams {
            volume_target: 1000.0,
            progression_speed_days: (1.0, 1.0),
            idea_completion_rate: 1.0,
            exit_rate: 0.0,
            ..base.productivity().params().clone()
        })
        .unwrap();
        let timing = TimingBehavior::new(TimingParams {
            event_sensitivity_threshold: 0.05,
            base_response_rate: 1.0,
            ..base.timing().params().clone()
        })
        .unwrap();
        Arc::new(
            ArchetypeBuilder::from_definition(&base)
                .coverage(CoverageBehavior::with_sizes(max_active, max_active).unwrap())
                .productivity(productivity)
                .timing(timing)
                .clear_interactions()
                .build()
                .unwrap(),
        )
    }

    fn analyst(max_active: usize) -> AnalystInstance {
        let profile = AnalystProfile {
            id: AnalystId(1),
            name: "Test 1".into(),
            archetype: "Follower".into(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            years_experience: 5.0,
            primary_sectors: vec![Sector::InformationTechnology],
            coverage_universe: vec!["SEC001".into(), "SEC002".into()],
        };
        AnalystInstance::new(profile, eager_archetype(max_active), FeedbackConfig::default(), 7)
    }

    fn event_action(security: &str, due: Timestamp, event_type: EventType) -> PendingAction {
        PendingAction {
            due,
            analyst: AnalystId(1),
            security: security.into(),
            trigger: Trigger::Event {
                id: EventId(1),
                event_type,
                magnitude: 0.5,
            },
        }
    }

    struct Fixture {
        provider: InMemoryProvider,
        consensus: ConsensusSnapshot,
        horizons: Horizons,
        policy: LifecyclePolicy,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                provider: provider(),
                consensus: ConsensusBook::new().commit(),
                horizons: Horizons::default(),
                policy: LifecyclePolicy::default(),
            }
        }

        fn ctx(&self, now: Timestamp) -> DecisionContext<'_> {
            DecisionContext {
                now,
                consensus: &self.consensus,
                provider: &self.provider,
                horizons: &self.horizons,
                policy: &self.policy,
            }
        }
    }

    #[test]
    fn test_new_idea_opens_with_forecast() {
        let fx = Fixture::new();
        let mut a = analyst(3);
        let pending = event_action("SEC001", t(1), EventType::EarningsAnnouncement);
        let res = resolve(&mut a, &pending, &fx.ctx(t(1)), ActionId(1));

        let action = res.action.unwrap();
        assert_eq!(action.action_type, ActionType::NewIdea);
        assert_eq!(action.idea_id, IdeaId::new(AnalystId(1), 1));
        assert!(action.content_payload.has_forecast());
        assert!(res.evaluation.is_some());
        assert_eq!(res.follow_up.unwrap().stage, IdeaStage::NewIdea);
        assert_eq!(a.state().active_ideas(), 1);
    }

    #[test]
    fn test_capacity_violation_is_incident() {
        let fx = Fixture::new();
        let mut a = analyst(1);
        let first = event_action("SEC001", t(1), EventType::SectorNews);
        resolve(&mut a, &first, &fx.ctx(t(1)), ActionId(1)).action.unwrap();

        let second = event_action("SEC002", t(2), EventType::SectorNews);
        let res = resolve(&mut a, &second, &fx.ctx(t(2)), ActionId(2));
        assert!(res.action.is_none());
        assert!(matches!(res.incident, Some(Incident::CapacityViolation(_))));
        assert_eq!(a.state().active_ideas(), 1);
    }

    #[test]
    fn test_missing_price_is_data_gap() {
        let fx = Fixture::new();
        let mut a = analyst(3);
        let pending = event_action("SEC002", t(1), EventType::GuidanceUpdate);
        let res = resolve(&mut a, &pending, &fx.ctx(t(1)), ActionId(1));
        assert!(res.action.is_none());
        assert!(matches!(res.incident, Some(Incident::DataGap(_))));
        assert_eq!(a.state().active_ideas(), 0);
    }

    #[test]
    fn test_reviews_walk_idea_to_active() {
        let fx = Fixture::new();
        let mut a = analyst(3);
        let open = event_action("SEC001", t(1), EventType::EarningsAnnouncement);
        let mut follow = resolve(&mut a, &open, &fx.ctx(t(1)), ActionId(1))
            .follow_up
            .unwrap();

        let mut types = Vec::new();
        for n in 2..4 {
            let review = PendingAction {
                due: follow.at,
                analyst: AnalystId(1),
                security: "SEC001".into(),
                trigger: Trigger::Review {
                    stage: follow.stage,
                },
            };
            let res = resolve(&mut a, &review, &fx.ctx(follow.at), ActionId(n));
            types.push(res.action.unwrap().content_payload.stage);
            follow = res.follow_up.unwrap();
        }
        assert_eq!(types, vec![IdeaStage::Wip, IdeaStage::Active]);

        let tpr = event_action("SEC001", follow.at, EventType::EarningsAnnouncement);
        let res = resolve(&mut a, &tpr, &fx.ctx(follow.at), ActionId(9));
        assert_eq!(
            res.action.unwrap().action_type,
            ActionType::TargetPriceRevision
        );
    }

    #[test]
    fn test_stale_review_skipped() {
        let fx = Fixture::new();
        let mut a = analyst(3);
        let review = PendingAction {
            due: t(5),
            analyst: AnalystId(1),
            security: "SEC001".into(),
            trigger: Trigger::Review {
                stage: IdeaStage::Wip,
            },
        };
        let res = resolve(&mut a, &review, &fx.ctx(t(5)), ActionId(1));
        assert_eq!(res.skipped, Some(SkipReason::StaleReview));
    }

    #[test]
    fn test_relevance_requires_coverage_and_threshold() {
        let p = provider();
        let a = analyst(3);
        let covered = MarketEvent::new(1u64, t(1), "SEC001", EventType::SectorNews, 0.5);
        let tiny = MarketEvent::new(2u64, t(1), "SEC001", EventType::SectorNews, 0.01);
        let other = MarketEvent::new(3u64, t(1), "SEC999", EventType::SectorNews, 0.9);
        assert!(is_relevant(&a, &covered, &p));
        assert!(!is_relevant(&a, &tiny, &p));
        assert!(!is_relevant(&a, &other, &p));
    }

    #[test]
    fn test_catch_up_only_after_silence() {
        let mut a = analyst(3);
        let start = t(1);
        assert!(catch_up(&mut a, t(5), start, 10.0, 1.0).is_none());
        let pending = catch_up(&mut a, t(20), start, 10.0, 1.0).unwrap();
        assert_eq!(pending.trigger, Trigger::CatchUp);
        assert!(a.covers(&pending.security));
    }

    #[test]
    fn test_frequent_publisher_breaks_silence_sooner() {
        let base = eager_archetype(4);
        let with_frequency = |publication_frequency: f64| {
            let timing = TimingBehavior::new(TimingParams {
                publication_frequency,
                ..base.timing().params().clone()
            })
            .unwrap();
            let archetype = ArchetypeBuilder::from_definition(&base)
                .timing(timing)
                .build()
                .unwrap();
            let profile = analyst(4).profile().clone();
            AnalystInstance::new(profile, Arc::new(archetype), FeedbackConfig::default(), 7)
        };

        // Twelve silent days against a 20-day allowance.
        let mut frequent = with_frequency(2.0);
        let mut sparse = with_frequency(0.5);
        assert!(catch_up(&mut frequent, t(13), t(1), 20.0, 1.0).is_some());
        assert!(catch_up(&mut sparse, t(13), t(1), 20.0, 1.0).is_none());
        assert!(catch_up(&mut sparse, t(30), t(1), 20.0, 1.0).is_none());
    }
}
