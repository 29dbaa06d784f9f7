//! Idea lifecycle state machine.
//!
//! ```text
//!   NewIdea ──► WIP ──► Active ──► Exit
//!                │
//!                └────► Pass
//! ```
//!
//! Exit and Pass are terminal. [`Idea::transition`] is a pure guard and
//! accumulator: it checks the transition graph, the minimum time in the
//! current stage, and the closing-action requirement, then records the
//! change. It never samples anything; durations are supplied by the caller.

pub mod error;
pub mod idea;
pub mod policy;

pub use error::{LifecycleError, Result};
pub use idea::{Idea, StageChange};
pub use policy::{LifecyclePolicy, validate_path};
