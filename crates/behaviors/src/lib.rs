//! Behavior components for simulated research analysts.
//!
//! Five independent, stateless policies describe an analyst along separate
//! axes:
//!
//! | Policy | Decides |
//! |--------|---------|
//! | [`AccuracyBehavior`] | how far published numbers land from the truth |
//! | [`TimingBehavior`] | whether and how fast to react to an event |
//! | [`CoverageBehavior`] | how many ideas can be open at once |
//! | [`BiasBehavior`] | directional drift toward or away from anchors |
//! | [`ProductivityBehavior`] | output cadence and stage progression |
//!
//! Every policy is built from a serde `*Params` struct and validated on
//! construction; out-of-range parameters are rejected, never clamped.
//! Sampling methods take the caller's RNG, so identical seeds and inputs
//! always give identical outputs.

pub mod accuracy;
pub mod bias;
pub mod component;
pub mod coverage;
pub mod distributions;
pub mod error;
pub mod productivity;
pub mod timing;

pub use accuracy::{AccuracyBehavior, AccuracyContext, AccuracyParams, Perturbation};
pub use bias::{BiasBehavior, BiasContext, BiasParams, BiasType};
pub use component::{BehaviorComponent, Dimension, UnknownDimension};
pub use coverage::{CoverageBehavior, CoverageParams};
pub use error::{Result, ValidationError};
pub use productivity::{ProductivityBehavior, ProductivityParams};
pub use timing::{TimingBehavior, TimingDecision, TimingParams};
