//! Market events and the ordered, read-only event feed.
//!
//! # Ordering
//!
//! The feed is sorted once at construction by `(timestamp, security_id, id)`.
//! Consumers walk it with a cursor; nothing in the engine ever mutates it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use types::{EventId, EventType, SecurityId, Timestamp};

use crate::error::{FeedError, Result};

// =============================================================================
// MarketEvent
// =============================================================================

/// An external, normalized market or corporate event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub security_id: SecurityId,
    pub event_type: EventType,
    /// Signed impact (-1.0 to +1.0). Relevance checks use the absolute value.
    pub magnitude: f64,
    /// Free-form numeric attributes (e.g. `surprise_pct`, `eps_actual`).
    #[serde(default)]
    pub payload: BTreeMap<String, f64>,
}

impl MarketEvent {
    pub fn new(
        id: impl Into<EventId>,
        timestamp: Timestamp,
        security_id: impl Into<SecurityId>,
        event_type: EventType,
        magnitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            security_id: security_id.into(),
            event_type,
            magnitude,
            payload: BTreeMap::new(),
        }
    }

    /// Attach a payload attribute.
    pub fn with_payload(mut self, key: impl Into<String>, value: f64) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn abs_magnitude(&self) -> f64 {
        self.magnitude.abs()
    }

    fn validate(&self) -> Result<()> {
        if self.security_id.trim().is_empty() {
            return Err(FeedError::InvalidEvent {
                id: self.id,
                reason: "empty security id".into(),
            });
        }
        if !(self.magnitude.is_finite() && (-1.0..=1.0).contains(&self.magnitude)) {
            return Err(FeedError::InvalidEvent {
                id: self.id,
                reason: format!("magnitude {} outside [-1, 1]", self.magnitude),
            });
        }
        if let Some((key, _)) = self.payload.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FeedError::InvalidEvent {
                id: self.id,
                reason: format!("payload '{key}' is not finite"),
            });
        }
        Ok(())
    }

    fn sort_key(&self) -> (Timestamp, &str, EventId) {
        (self.timestamp, self.security_id.as_str(), self.id)
    }
}

// =============================================================================
// EventFeed
// =============================================================================

/// Immutable, chronologically ordered collection of market events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventFeed {
    events: Vec<MarketEvent>,
}

impl EventFeed {
    /// Validate and sort events. Ids must be unique.
    pub fn new(mut events: Vec<MarketEvent>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for event in &events {
            event.validate()?;
            if !seen.insert(event.id) {
                return Err(FeedError::DuplicateEvent(event.id));
            }
        }
        events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(Self { events })
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MarketEvent> {
        self.events.get(index)
    }

    /// Index of the first event at or after `ts`.
    pub fn position_at(&self, ts: Timestamp) -> usize {
        self.events.partition_point(|e| e.timestamp < ts)
    }

    /// Events with `start <= timestamp < end`.
    pub fn between(&self, start: Timestamp, end: Timestamp) -> &[MarketEvent] {
        let lo = self.position_at(start);
        let hi = self.position_at(end).max(lo);
        &self.events[lo..hi]
    }

    /// Distinct securities referenced by the feed, sorted.
    pub fn securities(&self) -> BTreeSet<&str> {
        self.events.iter().map(|e| e.security_id.as_str()).collect()
    }
}
