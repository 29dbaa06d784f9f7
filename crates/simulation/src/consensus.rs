//! Versioned consensus snapshots.
//!
//! Analysts read consensus only through an immutable [`ConsensusSnapshot`].
//! Publications made during a tick are staged and become visible after the
//! next [`ConsensusBook::commit`], which the runner calls once per tick
//! before any analyst acts. Within a tick every analyst therefore sees the
//! same snapshot regardless of processing order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use types::{AnalystId, Recommendation, SecurityId};

/// Aggregated street view of one security.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEntry {
    /// Mean of contributors' latest targets.
    pub mean_target: f64,
    /// Mean recommendation score (+2 strong buy .. -2 strong sell).
    pub mean_score: f64,
    pub contributors: usize,
}

/// Immutable consensus view at a version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsensusSnapshot {
    version: u64,
    entries: Arc<BTreeMap<SecurityId, ConsensusEntry>>,
}

impl ConsensusSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, security: &str) -> Option<&ConsensusEntry> {
        self.entries.get(security)
    }

    pub fn mean_target(&self, security: &str) -> Option<f64> {
        self.get(security).map(|e| e.mean_target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Published {
    target: f64,
    recommendation: Recommendation,
}

/// Latest published view per (security, analyst).
#[derive(Debug, Clone, Default)]
pub struct ConsensusBook {
    views: BTreeMap<SecurityId, BTreeMap<AnalystId, Published>>,
    staged: Vec<(SecurityId, AnalystId, Published)>,
    withdrawn: bool,
    snapshot: ConsensusSnapshot,
}

impl ConsensusBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a publication. Invisible until the next commit.
    pub fn publish(
        &mut self,
        security: &str,
        analyst: AnalystId,
        target: f64,
        recommendation: Recommendation,
    ) {
        self.staged.push((
            security.to_string(),
            analyst,
            Published {
                target,
                recommendation,
            },
        ));
    }

    /// Remove an analyst's view once the idea is closed.
    pub fn withdraw(&mut self, security: &str, analyst: AnalystId) {
        self.staged.retain(|(s, a, _)| !(s == security && *a == analyst));
        if let Some(views) = self.views.get_mut(security) {
            self.withdrawn |= views.remove(&analyst).is_some();
        }
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Apply staged publications and bump the version.
    ///
    /// Returns the current snapshot unchanged when nothing is staged and no
    /// view was withdrawn since the last commit.
    pub fn commit(&mut self) -> ConsensusSnapshot {
        if !self.has_staged() && !self.withdrawn {
            return self.snapshot.clone();
        }
        for (security, analyst, view) in self.staged.drain(..) {
            self.views.entry(security).or_default().insert(analyst, view);
        }
        self.views.retain(|_, v| !v.is_empty());
        self.withdrawn = false;

        let entries = self
            .views
            .iter()
            .map(|(security, views)| {
                let n = views.len() as f64;
                let entry = ConsensusEntry {
                    mean_target: views.values().map(|v| v.target).sum::<f64>() / n,
                    mean_score: views.values().map(|v| v.recommendation.score()).sum::<f64>()
                        / n,
                    contributors: views.len(),
                };
                (security.clone(), entry)
            })
            .collect();

        self.snapshot = ConsensusSnapshot {
            version: self.snapshot.version + 1,
            entries: Arc::new(entries),
        };
        self.snapshot.clone()
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> &ConsensusSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_views_hidden_until_commit() {
        let mut book = ConsensusBook::new();
        book.publish("SEC001", AnalystId(1), 110.0, Recommendation::Buy);
        assert!(book.snapshot().get("SEC001").is_none());

        let snap = book.commit();
        assert_eq!(snap.version(), 1);
        assert_eq!(snap.mean_target("SEC001"), Some(110.0));
    }

    #[test]
    fn test_mean_over_latest_views() {
        let mut book = ConsensusBook::new();
        book.publish("SEC001", AnalystId(1), 100.0, Recommendation::Buy);
        book.publish("SEC001", AnalystId(2), 120.0, Recommendation::Sell);
        book.commit();
        book.publish("SEC001", AnalystId(1), 140.0, Recommendation::StrongBuy);
        let snap = book.commit();
        let entry = snap.get("SEC001").unwrap();
        assert_eq!(entry.contributors, 2);
        assert!((entry.mean_target - 130.0).abs() < 1e-9);
        assert!((entry.mean_score - 0.5).abs() < 1e-9);
        assert_eq!(snap.version(), 2);
    }

    #[test]
    fn test_commit_without_changes_keeps_version() {
        let mut book = ConsensusBook::new();
        book.publish("SEC001", AnalystId(1), 100.0, Recommendation::Hold);
        book.commit();
        let again = book.commit();
        assert_eq!(again.version(), 1);
    }

    #[test]
    fn test_withdraw_removes_view() {
        let mut book = ConsensusBook::new();
        book.publish("SEC001", AnalystId(1), 100.0, Recommendation::Hold);
        book.commit();
        book.withdraw("SEC001", AnalystId(1));
        let snap = book.commit();
        assert!(snap.get("SEC001").is_none());
        assert_eq!(snap.version(), 2);
    }

    #[test]
    fn test_old_snapshot_is_immutable() {
        let mut book = ConsensusBook::new();
        book.publish("SEC001", AnalystId(1), 100.0, Recommendation::Hold);
        let first = book.commit();
        book.publish("SEC001", AnalystId(1), 200.0, Recommendation::Buy);
        book.commit();
        assert_eq!(first.mean_target("SEC001"), Some(100.0));
    }
}
