//! Time-bounded rolling window.
//!
//! Like a fixed-capacity rolling window, but entries expire by age instead
//! of by count. Keeps a running sum for O(1) mean.

use std::collections::VecDeque;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use types::Timestamp;

/// Observations younger than `span` relative to the latest push. An entry
/// exactly `span` old has expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWindow {
    data: VecDeque<(Timestamp, f64)>,
    span_days: i64,
    sum: f64,
}

impl TimedWindow {
    pub fn new(span_days: i64) -> Self {
        Self {
            data: VecDeque::new(),
            span_days: span_days.max(1),
            sum: 0.0,
        }
    }

    /// Push an observation and evict everything older than the span.
    pub fn push(&mut self, at: Timestamp, value: f64) {
        self.data.push_back((at, value));
        self.sum += value;
        self.evict(at);
    }

    /// Drop entries at least `span` old.
    pub fn evict(&mut self, now: Timestamp) {
        let cutoff = now - Duration::days(self.span_days);
        while let Some(&(at, value)) = self.data.front() {
            if at > cutoff {
                break;
            }
            self.data.pop_front();
            self.sum -= value;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn span_days(&self) -> i64 {
        self.span_days
    }

    /// Returns `None` if the window is empty.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum / self.data.len() as f64)
        }
    }

    /// Mean of the entries that would survive eviction at `now`, without
    /// mutating the window.
    pub fn mean_as_of(&self, now: Timestamp) -> Option<f64> {
        let cutoff = now - Duration::days(self.span_days);
        let (count, sum) = self
            .data
            .iter()
            .filter(|(at, _)| *at > cutoff && *at <= now)
            .fold((0usize, 0.0), |(n, s), (_, v)| (n + 1, s + v));
        (count > 0).then(|| sum / count as f64)
    }
}
