//! Analyst archetypes: personas composed from behavior components.
//!
//! An archetype is composition, not inheritance. It holds exactly one policy
//! per [`Dimension`](behaviors::Dimension), plus interaction rules, hard
//! constraints, and calibration targets. Definitions are built and validated
//! through [`ArchetypeBuilder`], loaded from JSON via [`ArchetypeSpec`], or
//! looked up by name in the static [`registry`].

pub mod builder;
pub mod definition;
pub mod error;
pub mod registry;
pub mod spec;
pub mod templates;

pub use builder::ArchetypeBuilder;
pub use definition::{
    ArchetypeDefinition, Constraints, InteractionEffects, InteractionInputs, InteractionRule,
    SUPPORTED_INTERACTIONS, TargetRanges,
};
pub use error::{ConfigurationError, Result};
pub use spec::{ArchetypeSpec, InteractionRuleSpec, load_archetypes, parse_archetypes};
