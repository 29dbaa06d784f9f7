//! JSON feed files.
//!
//! ```json
//! {
//!   "securities": [
//!     { "id": "AAPL", "sector": "InformationTechnology",
//!       "series": { "Price": { "2023-01-03": 125.1 }, "Eps": { "2023-01-03": 1.88 } } }
//!   ],
//!   "events": [
//!     { "id": 1, "timestamp": "2023-02-02T21:00:00Z", "security_id": "AAPL",
//!       "event_type": "EarningsAnnouncement", "magnitude": 0.3,
//!       "payload": { "surprise_pct": 0.04 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use types::{Field, SecurityId, Sector};

use crate::error::{FeedError, Result};
use crate::events::{EventFeed, MarketEvent};
use crate::generator::SyntheticMarket;
use crate::provider::InMemoryProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub id: SecurityId,
    pub sector: Option<Sector>,
    #[serde(default)]
    pub series: BTreeMap<Field, BTreeMap<NaiveDate, f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedFile {
    #[serde(default)]
    pub securities: Vec<SecurityRecord>,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

impl FeedFile {
    /// Validate into an event feed and provider.
    pub fn into_market(self) -> Result<SyntheticMarket> {
        let mut provider = InMemoryProvider::new();
        for record in self.securities {
            if let Some(sector) = record.sector {
                provider.set_sector(record.id.clone(), sector);
            }
            for (field, series) in record.series {
                for (date, value) in series {
                    provider.insert(record.id.clone(), field, date, value)?;
                }
            }
        }
        Ok(SyntheticMarket {
            feed: EventFeed::new(self.events)?,
            provider,
        })
    }
}

pub fn parse_feed(json: &str) -> Result<SyntheticMarket> {
    serde_json::from_str::<FeedFile>(json)?.into_market()
}

/// Read a feed file from disk.
pub fn load_feed(path: impl AsRef<Path>) -> Result<SyntheticMarket> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feed(&json)
}
