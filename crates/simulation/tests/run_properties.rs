//! Whole-run properties: deterministic reruns, the coverage capacity bound,
//! legal idea paths, idempotent evaluation, and checkpoint resume.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use feed::{SyntheticMarketConfig, SyntheticMarketGenerator};
use lifecycle::{LifecyclePolicy, validate_path};
use parking_lot::Mutex;
use simulation::{
    Checkpoint, HookContext, PopulationEntry, ResearchAction, Simulation, SimulationConfig,
    SimulationHook,
};
use types::{ActionType, AnalystId, IdeaStage};

#[derive(Default)]
struct ActionLog {
    lines: Mutex<Vec<String>>,
    actions: Mutex<Vec<ResearchAction>>,
}

impl SimulationHook for ActionLog {
    fn name(&self) -> &str {
        "ActionLog"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        let mut lines = self.lines.lock();
        for action in &actions {
            lines.push(serde_json::to_string(action).unwrap());
        }
        self.actions.lock().extend(actions);
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Every built-in archetype over a one-year synthetic market.
fn simulation(seed: u64) -> Simulation {
    simulation_with_policy(seed, LifecyclePolicy::default())
}

fn simulation_with_policy(seed: u64, policy: LifecyclePolicy) -> Simulation {
    let (start, end) = (date(2022, 1, 1), date(2022, 12, 31));
    let market = SyntheticMarketGenerator::new(
        SyntheticMarketConfig::default()
            .with_dates(start, end)
            .with_securities(30),
        11,
    )
    .generate()
    .unwrap();
    let population: Vec<PopulationEntry> = archetypes::registry::names()
        .map(|name| PopulationEntry::new(archetypes::registry::shared(name).unwrap(), 3))
        .collect();
    let config = SimulationConfig::new(start, end)
        .with_seed(seed)
        .with_lifecycle(policy);
    Simulation::new(config, market.feed, Arc::new(market.provider), &population).unwrap()
}

fn run_logged(seed: u64) -> (Simulation, Arc<ActionLog>) {
    let mut sim = simulation(seed);
    let log = Arc::new(ActionLog::default());
    sim.add_hook(log.clone());
    sim.run().unwrap();
    (sim, log)
}

#[test]
fn test_identical_inputs_give_identical_action_logs() {
    let (a, log_a) = run_logged(42);
    let (b, log_b) = run_logged(42);

    let lines_a = log_a.lines.lock();
    assert!(!lines_a.is_empty());
    assert_eq!(*lines_a, *log_b.lines.lock());
    assert_eq!(a.action_log_hash(), b.action_log_hash());

    let (c, _) = run_logged(43);
    assert_ne!(a.action_log_hash(), c.action_log_hash());
}

#[test]
fn test_open_ideas_never_exceed_capacity() {
    let (sim, log) = run_logged(7);
    let max_active: BTreeMap<AnalystId, usize> = sim
        .analysts()
        .iter()
        .map(|a| (a.id(), a.archetype().coverage().max_active_coverage()))
        .collect();

    let mut open: BTreeMap<AnalystId, usize> = BTreeMap::new();
    for action in log.actions.lock().iter() {
        let count = open.entry(action.analyst_id).or_insert(0);
        if action.action_type == ActionType::NewIdea {
            *count += 1;
        } else if action.content_payload.stage.is_terminal() {
            *count -= 1;
        }
        assert!(
            *count <= max_active[&action.analyst_id],
            "analyst {} holds {} ideas at {}",
            action.analyst_id.0,
            count,
            action.timestamp
        );
    }

    for analyst in sim.analysts() {
        let max = analyst.archetype().coverage().max_active_coverage();
        assert!(analyst.state().active_ideas() <= max);
    }
}

#[test]
fn test_every_idea_follows_a_legal_path() {
    let (sim, log) = run_logged(7);
    let policy = sim.config().lifecycle;

    let mut ideas = 0;
    for analyst in sim.analysts() {
        let state = analyst.state();
        for idea in state.open_ideas().chain(state.closed_ideas().iter()) {
            validate_path(&idea.path(), &policy).unwrap();
            ideas += 1;
        }
    }
    assert!(ideas > 0);

    // Nothing is emitted for an idea after it closes.
    let mut closed = BTreeSet::new();
    for action in log.actions.lock().iter() {
        assert!(!closed.contains(&action.idea_id));
        if action.content_payload.stage.is_terminal() {
            closed.insert(action.idea_id);
        }
    }
}

fn idea_paths(sim: &Simulation) -> Vec<Vec<IdeaStage>> {
    sim.analysts()
        .iter()
        .flat_map(|a| {
            let state = a.state();
            state
                .open_ideas()
                .chain(state.closed_ideas().iter())
                .map(|i| i.path())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn abandons_active(path: &[IdeaStage]) -> bool {
    path.windows(2)
        .any(|w| w == [IdeaStage::Active, IdeaStage::Pass].as_slice())
}

#[test]
fn test_active_to_pass_follows_lifecycle_policy() {
    let (sim, _) = run_logged(7);
    assert!(!idea_paths(&sim).iter().any(|p| abandons_active(p)));

    let permissive = LifecyclePolicy::default().with_active_to_pass(true);
    let mut sim = simulation_with_policy(7, permissive);
    let log = Arc::new(ActionLog::default());
    sim.add_hook(log.clone());
    sim.run().unwrap();

    let paths = idea_paths(&sim);
    let abandoned: Vec<&Vec<IdeaStage>> = paths.iter().filter(|p| abandons_active(p)).collect();
    assert!(!abandoned.is_empty());
    for path in &paths {
        validate_path(path, &permissive).unwrap();
    }
    for path in abandoned {
        assert!(validate_path(path, &LifecyclePolicy::default()).is_err());
    }
    assert!(log.actions.lock().iter().any(|a| {
        a.action_type == ActionType::Pass
            && a.content_payload.from_stage == Some(IdeaStage::Active)
    }));
}

#[test]
fn test_each_forecast_is_evaluated_once() {
    let (sim, _) = run_logged(7);
    let records = sim.scheduler().records();
    assert!(!records.is_empty());

    let keys: BTreeSet<_> = records
        .iter()
        .map(|r| (r.action_id, r.horizon_days))
        .collect();
    assert_eq!(keys.len(), records.len());
    for r in records {
        assert!(r.evaluated_at >= r.issued_at);
        assert!(sim.scheduler().is_evaluated(r.action_id, r.horizon_days));
    }

    let evaluated: u64 = sim
        .analysts()
        .iter()
        .map(|a| a.state().performance().evaluations())
        .sum();
    assert_eq!(evaluated, records.len() as u64);
}

#[test]
fn test_resume_from_checkpoint_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.checkpoint.json");

    let mut first = simulation(42);
    for _ in 0..40 {
        first.step().unwrap();
    }
    first.checkpoint().save(&path).unwrap();
    let expected = first.run().unwrap();

    let mut resumed = simulation(42);
    resumed.resume(&Checkpoint::load(&path).unwrap()).unwrap();
    let log = Arc::new(ActionLog::default());
    resumed.add_hook(log.clone());
    let summary = resumed.run().unwrap();

    assert_eq!(summary, expected);
    assert_eq!(
        log.actions.lock().len() as u64,
        expected.total_actions - Checkpoint::load(&path).unwrap().actions_emitted
    );
}
