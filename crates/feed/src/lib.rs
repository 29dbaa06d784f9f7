//! Event source for the analyst simulation.
//!
//! This crate provides:
//! - **Events**: normalized [`MarketEvent`]s and the ordered, read-only [`EventFeed`]
//! - **Provider**: the point-in-time [`MarketDataProvider`] trait and an in-memory implementation
//! - **Sectors**: security-to-GICS-sector mapping
//! - **Generator**: a seeded synthetic market (prices, quarterly EPS, events)
//! - **Loader**: JSON feed files
//!
//! The engine consumes a feed and provider fully in memory; nothing here
//! performs I/O once a run has started.

pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod loader;
pub mod provider;
pub mod sectors;

pub use config::{
    EarningsConfig, EventFrequency, MagnitudeConfig, PricePathConfig, RandomEventConfig,
    SyntheticMarketConfig,
};
pub use error::{FeedError, Result};
pub use events::{EventFeed, MarketEvent};
pub use generator::{SyntheticMarket, SyntheticMarketGenerator};
pub use loader::{FeedFile, SecurityRecord, load_feed, parse_feed};
pub use provider::{InMemoryProvider, MarketDataProvider};
pub use sectors::SectorModel;
