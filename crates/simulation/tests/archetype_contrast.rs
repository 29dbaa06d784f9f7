//! End-to-end contrast between a leading, accurate analyst and a consensus
//! follower covering the same single security.
//!
//! Two years of quarterly earnings beats, no other events. The leader should
//! revise its target first on the events both analysts revise on and carry a
//! smaller realized forecast error.

use std::collections::BTreeMap;
use std::sync::Arc;

use archetypes::{ArchetypeBuilder, ArchetypeDefinition};
use behaviors::{AccuracyBehavior, AccuracyParams, TimingBehavior, TimingParams};
use chrono::NaiveDate;
use feed::{EarningsConfig, SyntheticMarketConfig, SyntheticMarketGenerator};
use parking_lot::Mutex;
use simulation::{
    HookContext, PopulationEntry, ResearchAction, Simulation, SimulationConfig, SimulationHook,
};
use types::{ActionType, AnalystId, EventId, Timestamp};

/// First target-price revision per (triggering event, analyst).
#[derive(Default)]
struct RevisionLog {
    first: Mutex<BTreeMap<(EventId, AnalystId), Timestamp>>,
}

impl SimulationHook for RevisionLog {
    fn name(&self) -> &str {
        "RevisionLog"
    }

    fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
        let mut first = self.first.lock();
        for action in actions {
            if action.action_type != ActionType::TargetPriceRevision {
                continue;
            }
            if let Some(event) = action.content_payload.trigger {
                first
                    .entry((event, action.analyst_id))
                    .or_insert(action.timestamp);
            }
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn persona(
    base: ArchetypeDefinition,
    consensus_relationship: f64,
    accuracy_mean: f64,
) -> Arc<ArchetypeDefinition> {
    let accuracy = AccuracyBehavior::new(AccuracyParams {
        mean: accuracy_mean,
        ..base.accuracy().params().clone()
    })
    .unwrap();
    let timing = TimingBehavior::new(TimingParams {
        consensus_relationship,
        base_response_rate: 1.0,
        ..base.timing().params().clone()
    })
    .unwrap();
    Arc::new(
        ArchetypeBuilder::from_definition(&base)
            .accuracy(accuracy)
            .timing(timing)
            .build()
            .unwrap(),
    )
}

fn simulation(seed: u64) -> Simulation {
    let (start, end) = (date(2021, 1, 1), date(2022, 12, 31));
    let market = SyntheticMarketGenerator::new(
        SyntheticMarketConfig::default()
            .with_dates(start, end)
            .with_securities(1)
            .with_earnings(EarningsConfig {
                surprise_range: (0.05, 0.12),
                ..Default::default()
            })
            .earnings_only(),
        seed,
    )
    .generate()
    .unwrap();

    let oracle = persona(archetypes::templates::oracle().unwrap(), -0.8, 0.85);
    let follower = persona(archetypes::templates::follower().unwrap(), 0.8, 0.55);
    let population = vec![
        PopulationEntry::new(oracle, 1),
        PopulationEntry::new(follower, 1),
    ];
    let config = SimulationConfig::new(start, end).with_seed(seed);
    Simulation::new(config, market.feed, Arc::new(market.provider), &population).unwrap()
}

fn analyst_of(sim: &Simulation, archetype: &str) -> AnalystId {
    sim.analysts()
        .iter()
        .find(|a| a.profile().archetype == archetype)
        .map(|a| a.id())
        .unwrap()
}

#[test]
fn test_oracle_leads_follower_and_errs_less() {
    let mut shared = 0;
    let mut oracle_first = 0;
    let mut oracle_errors = Vec::new();
    let mut follower_errors = Vec::new();

    for seed in 1..=5 {
        let mut sim = simulation(seed);
        let revisions = Arc::new(RevisionLog::default());
        sim.add_hook(revisions.clone());
        sim.run().unwrap();
        let oracle = analyst_of(&sim, "Oracle");
        let follower = analyst_of(&sim, "Follower");

        let first = revisions.first.lock();
        for (&(event, analyst), &o) in first.iter() {
            if analyst != oracle {
                continue;
            }
            if let Some(&f) = first.get(&(event, follower)) {
                shared += 1;
                if o < f {
                    oracle_first += 1;
                }
            }
        }

        for record in sim.scheduler().records() {
            if record.analyst_id == oracle {
                oracle_errors.push(record.forecast_error);
            } else if record.analyst_id == follower {
                follower_errors.push(record.forecast_error);
            }
        }
    }

    assert!(shared >= 5, "only {shared} events drew a revision from both analysts");
    assert!(
        oracle_first as f64 >= 0.8 * shared as f64,
        "oracle revised first on {oracle_first} of {shared} shared events"
    );

    assert!(!oracle_errors.is_empty() && !follower_errors.is_empty());
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    assert!(
        mean(&oracle_errors) < mean(&follower_errors),
        "oracle error {:.4} vs follower {:.4}",
        mean(&oracle_errors),
        mean(&follower_errors)
    );
}
