//! Analyst factory: builds the population from archetypes and the provider's universe.
//!
//! Ids are assigned sequentially from 1 in population order. Coverage
//! universes and profile fields are drawn from a factory RNG seeded from the
//! run seed, so the same config always yields the same population.

use std::collections::BTreeSet;
use std::sync::Arc;

use archetypes::ArchetypeDefinition;
use behaviors::distributions;
use feed::MarketDataProvider;
use rand::SeedableRng;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::{AnalystId, SecurityId, Sector};

use crate::analyst::{AnalystInstance, AnalystProfile};
use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};

/// Salt separating the factory stream from per-analyst streams.
const FACTORY_SALT: u64 = 0xFAC7_0000_0000_0001;

/// `count` analysts built from one archetype.
#[derive(Debug, Clone)]
pub struct PopulationEntry {
    pub archetype: Arc<ArchetypeDefinition>,
    pub count: usize,
}

impl PopulationEntry {
    pub fn new(archetype: Arc<ArchetypeDefinition>, count: usize) -> Self {
        Self { archetype, count }
    }
}

/// Population summary used in fingerprints and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub archetype: String,
    pub count: usize,
}

impl From<&PopulationEntry> for PopulationSpec {
    fn from(entry: &PopulationEntry) -> Self {
        Self {
            archetype: entry.archetype.name().to_string(),
            count: entry.count,
        }
    }
}

/// Spawn every analyst of the population.
///
/// Fails with [`SimulationError::EmptyPopulation`] when no analyst would be
/// created, and with [`SimulationError::NoEligibleCoverage`] when an
/// archetype's sector whitelist matches no security.
pub fn spawn_population(
    population: &[PopulationEntry],
    provider: &dyn MarketDataProvider,
    config: &SimulationConfig,
) -> Result<Vec<AnalystInstance>> {
    if population.iter().all(|e| e.count == 0) {
        return Err(SimulationError::EmptyPopulation);
    }

    let mut universe: Vec<(SecurityId, Sector)> = provider
        .securities()
        .into_iter()
        .filter_map(|s| provider.sector(&s).map(|sector| (s, sector)))
        .collect();
    universe.sort();

    let mut rng = StdRng::seed_from_u64(config.seed ^ FACTORY_SALT);
    let mut next_id = 1u64;
    let mut analysts = Vec::new();

    for entry in population.iter().filter(|e| e.count > 0) {
        let (spawned, id) = spawn_archetype(entry, &universe, next_id, config, &mut rng)?;
        next_id = id;
        analysts.extend(spawned);
    }

    debug!(
        analysts = analysts.len(),
        securities = universe.len(),
        "population spawned"
    );
    Ok(analysts)
}

/// Spawn one archetype's analysts. Returns next available analyst id.
fn spawn_archetype(
    entry: &PopulationEntry,
    universe: &[(SecurityId, Sector)],
    mut next_id: u64,
    config: &SimulationConfig,
    rng: &mut StdRng,
) -> Result<(Vec<AnalystInstance>, u64)> {
    let archetype = &entry.archetype;
    let eligible: Vec<&(SecurityId, Sector)> = universe
        .iter()
        .filter(|(_, sector)| archetype.constraints().allows_sector(*sector))
        .collect();
    if eligible.is_empty() {
        return Err(SimulationError::NoEligibleCoverage(
            archetype.name().to_string(),
        ));
    }

    let coverage = archetype.coverage();
    let wanted = coverage.max_active_coverage().max(coverage.ideal_coverage_size())
        + coverage.ideal_coverage_size() / 2;
    let size = wanted.min(eligible.len()).max(1);

    let mut analysts = Vec::with_capacity(entry.count);
    for n in 0..entry.count {
        let mut picks = eligible.clone();
        picks.shuffle(rng);
        picks.truncate(size);

        let mut coverage_universe: Vec<SecurityId> =
            picks.iter().map(|(s, _)| s.clone()).collect();
        coverage_universe.sort();
        let primary_sectors: Vec<Sector> = picks
            .iter()
            .map(|(_, sector)| *sector)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let profile = AnalystProfile {
            id: AnalystId(next_id),
            name: format!("{} {}", archetype.name(), n + 1),
            archetype: archetype.name().to_string(),
            start_date: config.start,
            years_experience: distributions::uniform(rng, 2.0, 20.0).round(),
            primary_sectors,
            coverage_universe,
        };
        analysts.push(AnalystInstance::new(
            profile,
            Arc::clone(archetype),
            config.feedback,
            config.seed,
        ));
        next_id += 1;
    }

    Ok((analysts, next_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archetypes::{ArchetypeBuilder, templates};
    use feed::{InMemoryProvider, SectorModel};

    fn provider() -> InMemoryProvider {
        let mut provider = InMemoryProvider::new().with_sectors(SectorModel::default());
        for (i, sector) in [
            Sector::InformationTechnology,
            Sector::InformationTechnology,
            Sector::Energy,
            Sector::HealthCare,
        ]
        .into_iter()
        .enumerate()
        {
            provider.set_sector(format!("SEC{i:03}"), sector);
        }
        provider
    }

    #[test]
    fn test_sequential_ids_and_names() {
        let population = vec![
            PopulationEntry::new(Arc::new(templates::oracle().unwrap()), 2),
            PopulationEntry::new(Arc::new(templates::follower().unwrap()), 1),
        ];
        let analysts =
            spawn_population(&population, &provider(), &SimulationConfig::default()).unwrap();
        let ids: Vec<u64> = analysts.iter().map(|a| a.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(analysts[0].profile().name, "Oracle 1");
        assert_eq!(analysts[2].profile().archetype, "Follower");
    }

    #[test]
    fn test_whitelist_limits_coverage() {
        let specialist = ArchetypeBuilder::from_definition(&templates::follower().unwrap())
            .name("Energy Desk")
            .sector_whitelist([Sector::Energy])
            .build()
            .unwrap();
        let population = vec![PopulationEntry::new(Arc::new(specialist), 3)];
        let analysts =
            spawn_population(&population, &provider(), &SimulationConfig::default()).unwrap();
        for analyst in &analysts {
            assert_eq!(analyst.profile().coverage_universe, vec!["SEC002".to_string()]);
            assert_eq!(analyst.profile().primary_sectors, vec![Sector::Energy]);
        }
    }

    #[test]
    fn test_no_eligible_coverage() {
        let utilities = ArchetypeBuilder::from_definition(&templates::follower().unwrap())
            .sector_whitelist([Sector::Utilities])
            .build()
            .unwrap();
        let population = vec![PopulationEntry::new(Arc::new(utilities), 1)];
        let err = spawn_population(&population, &provider(), &SimulationConfig::default())
            .unwrap_err();
        assert!(matches!(err, SimulationError::NoEligibleCoverage(_)));
    }

    #[test]
    fn test_empty_population() {
        let population = vec![PopulationEntry::new(Arc::new(templates::oracle().unwrap()), 0)];
        assert!(matches!(
            spawn_population(&population, &provider(), &SimulationConfig::default()),
            Err(SimulationError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_population_is_deterministic() {
        let population = vec![PopulationEntry::new(Arc::new(templates::sprayer().unwrap()), 4)];
        let config = SimulationConfig::default().with_seed(11);
        let a = spawn_population(&population, &provider(), &config).unwrap();
        let b = spawn_population(&population, &provider(), &config).unwrap();
        let profiles = |v: &[AnalystInstance]| {
            v.iter().map(|a| a.profile().clone()).collect::<Vec<_>>()
        };
        assert_eq!(profiles(&a), profiles(&b));
    }
}
