//! Run fingerprints and checkpoints.
//!
//! A checkpoint does not serialize engine state. It records the run
//! fingerprint (hash of every input) and the action-log hash at a tick;
//! resuming replays the run deterministically up to that tick and verifies
//! both hashes before continuing.

use std::fs;
use std::path::Path;

use archetypes::ArchetypeDefinition;
use feed::MarketEvent;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::Timestamp;

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::factory::PopulationSpec;

/// Point in a run that can be replayed to and verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub fingerprint: String,
    pub tick: u64,
    pub timestamp: Option<Timestamp>,
    pub actions_emitted: u64,
    pub action_log_hash: String,
}

impl Checkpoint {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    config: &'a SimulationConfig,
    archetypes: &'a [&'a ArchetypeDefinition],
    population: &'a [PopulationSpec],
    events: &'a [MarketEvent],
}

/// SHA-256 over the serialized run inputs.
///
/// `force_sequential` is excluded: it changes scheduling, never results.
pub fn fingerprint(
    config: &SimulationConfig,
    archetypes: &[&ArchetypeDefinition],
    population: &[PopulationSpec],
    events: &[MarketEvent],
) -> Result<String> {
    let config = config.clone().with_force_sequential(false);
    let input = FingerprintInput {
        config: &config,
        archetypes,
        population,
        events,
    };
    let json = serde_json::to_vec(&input)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archetypes::templates;
    use chrono::{TimeZone, Utc};

    fn events() -> Vec<MarketEvent> {
        vec![MarketEvent::new(
            1u64,
            Utc.with_ymd_and_hms(2022, 2, 1, 12, 0, 0).unwrap(),
            "SEC001",
            types::EventType::EarningsAnnouncement,
            0.4,
        )]
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let oracle = templates::oracle().unwrap();
        let population = vec![PopulationSpec {
            archetype: "Oracle".into(),
            count: 2,
        }];
        let config = SimulationConfig::default();
        let a = fingerprint(&config, &[&oracle], &population, &events()).unwrap();
        let b = fingerprint(
            &config.clone().with_force_sequential(true),
            &[&oracle],
            &population,
            &events(),
        )
        .unwrap();
        let c = fingerprint(&config.with_seed(1), &[&oracle], &population, &events()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_checkpoint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.checkpoint.json");
        let checkpoint = Checkpoint {
            fingerprint: "ab".repeat(32),
            tick: 12,
            timestamp: Some(Utc.with_ymd_and_hms(2022, 2, 1, 12, 0, 0).unwrap()),
            actions_emitted: 40,
            action_log_hash: "cd".repeat(32),
        };
        checkpoint.save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap(), checkpoint);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Checkpoint::load("/nonexistent/run.checkpoint.json").unwrap_err();
        assert!(matches!(err, SimulationError::Io { .. }));
    }
}
