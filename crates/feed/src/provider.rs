//! Point-in-time market and fundamental data access.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use types::{Field, SecurityId, Sector};

use crate::error::{FeedError, Result};
use crate::sectors::SectorModel;

/// Read-only source of normalized time-series data.
///
/// Lookups are as-of: the latest observation on or before the requested
/// date. Implementations must be deterministic and free of I/O during a run.
pub trait MarketDataProvider: Send + Sync {
    /// Latest value of `field` observed on or before `date`.
    fn value_as_of(&self, security: &str, field: Field, date: NaiveDate) -> Option<f64>;

    /// Observations with `from <= date <= to`, oldest first.
    fn history(
        &self,
        security: &str,
        field: Field,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(NaiveDate, f64)>;

    fn sector(&self, security: &str) -> Option<Sector>;

    /// All securities the provider knows, sorted.
    fn securities(&self) -> Vec<SecurityId>;
}

type Series = BTreeMap<NaiveDate, f64>;

/// Provider backed by in-memory ordered maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: BTreeMap<(SecurityId, Field), Series>,
    sectors: SectorModel,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sectors(mut self, sectors: SectorModel) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn set_sector(&mut self, security: impl Into<SecurityId>, sector: Sector) {
        self.sectors.add(security, sector);
    }

    pub fn sector_model(&self) -> &SectorModel {
        &self.sectors
    }

    /// Insert or overwrite one observation. Values must be finite.
    pub fn insert(
        &mut self,
        security: impl Into<SecurityId>,
        field: Field,
        date: NaiveDate,
        value: f64,
    ) -> Result<()> {
        let security = security.into();
        if !value.is_finite() {
            return Err(FeedError::InvalidValue {
                security,
                field,
                value,
            });
        }
        self.series
            .entry((security, field))
            .or_default()
            .insert(date, value);
        Ok(())
    }

    /// Number of observations stored for a series.
    pub fn series_len(&self, security: &str, field: Field) -> usize {
        self.series
            .get(&(security.to_string(), field))
            .map_or(0, |s| s.len())
    }

    fn series(&self, security: &str, field: Field) -> Option<&Series> {
        self.series.get(&(security.to_string(), field))
    }
}

impl MarketDataProvider for InMemoryProvider {
    fn value_as_of(&self, security: &str, field: Field, date: NaiveDate) -> Option<f64> {
        self.series(security, field)?
            .range(..=date)
            .next_back()
            .map(|(_, v)| *v)
    }

    fn history(
        &self,
        security: &str,
        field: Field,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(NaiveDate, f64)> {
        if from > to {
            return Vec::new();
        }
        self.series(security, field)
            .map(|s| s.range(from..=to).map(|(d, v)| (*d, *v)).collect())
            .unwrap_or_default()
    }

    fn sector(&self, security: &str) -> Option<Sector> {
        self.sectors.sector(security)
    }

    fn securities(&self) -> Vec<SecurityId> {
        let mut ids: Vec<SecurityId> = self
            .series
            .keys()
            .map(|(s, _)| s.clone())
            .chain(self.sectors.securities().cloned())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
