//! Static name -> constructor registry of built-in archetypes.

use std::sync::Arc;

use crate::definition::ArchetypeDefinition;
use crate::error::{ConfigurationError, Result};
use crate::templates;

type Constructor = fn() -> Result<ArchetypeDefinition>;

/// Built-in archetypes by lowercase name.
pub const BUILTIN: &[(&str, Constructor)] = &[
    ("oracle", templates::oracle),
    ("follower", templates::follower),
    ("sprayer", templates::sprayer),
    ("specialist", templates::specialist),
    ("contrarian", templates::contrarian),
];

/// Names of all built-in archetypes.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

/// Build a built-in archetype by name (case-insensitive).
pub fn builtin(name: &str) -> Result<ArchetypeDefinition> {
    let key = name.trim().to_ascii_lowercase();
    BUILTIN
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, constructor)| constructor())
        .unwrap_or_else(|| Err(ConfigurationError::UnknownArchetype(name.to_string())))
}

/// Shared handle to a built-in archetype.
pub fn shared(name: &str) -> Result<Arc<ArchetypeDefinition>> {
    builtin(name).map(Arc::new)
}

/// Construct every built-in archetype, failing on the first invalid one.
pub fn validate_all() -> Result<Vec<Arc<ArchetypeDefinition>>> {
    BUILTIN
        .iter()
        .map(|(_, constructor)| constructor().map(Arc::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_validate() {
        let all = validate_all().unwrap();
        assert_eq!(all.len(), BUILTIN.len());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(builtin("ORACLE").unwrap().name(), "Oracle");
        assert!(matches!(
            builtin("astrologer"),
            Err(ConfigurationError::UnknownArchetype(_))
        ));
    }
}
