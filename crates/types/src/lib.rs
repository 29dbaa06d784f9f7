//! Core types for the analyst research simulation.
//!
//! This crate provides all shared data types used across the workspace:
//! newtype identifiers, timeline helpers, and the market/research enums
//! that behaviors, the lifecycle machine, and the engine agree on.

pub mod ids;
pub mod market;
pub mod research;
pub mod time;

pub use ids::{ActionId, AnalystId, EventId, IdeaId, RecordId, SecurityId};
pub use market::{EventType, Field, Sector};
pub use research::{ActionType, ContentType, IdeaStage, PerformanceState, Recommendation};
pub use time::Timestamp;
