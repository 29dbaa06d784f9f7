//! JSON-loadable archetype specifications.
//!
//! ```json
//! {
//!   "name": "Quiet Oracle",
//!   "extends": "oracle",
//!   "behaviors": [
//!     { "dimension": "productivity", "params": { "volume_target": 2.0 } }
//!   ],
//!   "interactions": [ { "source": "bias", "target": "accuracy", "factor": 0.2 } ]
//! }
//! ```

use std::fs;
use std::path::Path;

use behaviors::{BehaviorComponent, Dimension};
use serde::{Deserialize, Serialize};

use crate::builder::ArchetypeBuilder;
use crate::definition::{ArchetypeDefinition, Constraints, TargetRanges};
use crate::error::{ConfigurationError, Result};
use crate::registry;

/// Interaction rule with dimension names as plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRuleSpec {
    pub source: String,
    pub target: String,
    pub factor: f64,
}

/// Declarative archetype as found in config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchetypeSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Built-in archetype to start from; listed behaviors override its dimensions.
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorComponent>,
    /// Replaces the base archetype's rules when non-empty.
    #[serde(default)]
    pub interactions: Vec<InteractionRuleSpec>,
    #[serde(default)]
    pub constraints: Option<Constraints>,
    #[serde(default)]
    pub targets: Option<TargetRanges>,
}

impl TryFrom<ArchetypeSpec> for ArchetypeDefinition {
    type Error = ConfigurationError;

    fn try_from(spec: ArchetypeSpec) -> Result<Self> {
        let mut builder = match &spec.extends {
            Some(base) => ArchetypeBuilder::from_definition(&registry::builtin(base)?),
            None => ArchetypeBuilder::default(),
        }
        .name(spec.name);

        if !spec.description.is_empty() {
            builder = builder.description(spec.description);
        }
        for component in spec.behaviors {
            builder = builder.component(component);
        }
        if !spec.interactions.is_empty() {
            builder = builder.clear_interactions();
            for rule in spec.interactions {
                let source: Dimension = rule.source.parse()?;
                let target: Dimension = rule.target.parse()?;
                builder = builder.interaction(source, target, rule.factor);
            }
        }
        if let Some(constraints) = spec.constraints {
            builder = builder.constraints(constraints);
        }
        if let Some(targets) = spec.targets {
            builder = builder.targets(targets);
        }
        builder.build()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ArchetypeSpec>),
    One(Box<ArchetypeSpec>),
}

/// Parse one archetype object or an array of them.
pub fn parse_archetypes(json: &str) -> Result<Vec<ArchetypeDefinition>> {
    let specs = match serde_json::from_str::<OneOrMany>(json)? {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![*spec],
    };
    specs.into_iter().map(ArchetypeDefinition::try_from).collect()
}

/// Load archetypes from a JSON file.
pub fn load_archetypes(path: impl AsRef<Path>) -> Result<Vec<ArchetypeDefinition>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_archetypes(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extends_and_overrides() {
        let json = r#"{
            "name": "Quiet Oracle",
            "extends": "oracle",
            "behaviors": [
                { "dimension": "productivity", "params": { "volume_target": 2.0 } }
            ]
        }"#;
        let defs = parse_archetypes(json).unwrap();
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!(def.name(), "Quiet Oracle");
        assert_eq!(def.productivity().volume_target(), 2.0);
        assert_eq!(def.accuracy().mean(), 0.75);
    }

    #[test]
    fn test_unknown_dimension_name() {
        let json = r#"{
            "name": "Broken",
            "extends": "follower",
            "interactions": [ { "source": "mood", "target": "accuracy", "factor": 0.1 } ]
        }"#;
        assert!(matches!(
            parse_archetypes(json),
            Err(ConfigurationError::UnknownDimension(_))
        ));
    }

    #[test]
    fn test_incomplete_spec_without_base() {
        let json = r#"[{
            "name": "Bare",
            "behaviors": [ { "dimension": "accuracy", "params": { "mean": 0.7 } } ]
        }]"#;
        assert!(matches!(
            parse_archetypes(json),
            Err(ConfigurationError::MissingDimension { .. })
        ));
    }

    #[test]
    fn test_invalid_behavior_params_rejected() {
        let json = r#"{
            "name": "Bad",
            "extends": "oracle",
            "behaviors": [ { "dimension": "accuracy", "params": { "mean": 3.0 } } ]
        }"#;
        assert!(matches!(parse_archetypes(json), Err(ConfigurationError::Json(_))));
    }
}
