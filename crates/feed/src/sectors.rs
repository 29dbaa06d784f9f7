//! Security-to-sector classification.
//!
//! Backed by ordered maps so iteration order (and therefore anything seeded
//! off it) is stable across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::{SecurityId, Sector};

/// Maps securities to their GICS sectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorModel {
    security_to_sector: BTreeMap<SecurityId, Sector>,
    sector_to_securities: BTreeMap<Sector, Vec<SecurityId>>,
}

impl SectorModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or reassign a security.
    pub fn add(&mut self, security: impl Into<SecurityId>, sector: Sector) {
        let security = security.into();
        if let Some(previous) = self.security_to_sector.insert(security.clone(), sector)
            && let Some(list) = self.sector_to_securities.get_mut(&previous)
        {
            list.retain(|s| s != &security);
        }
        let list = self.sector_to_securities.entry(sector).or_default();
        if let Err(pos) = list.binary_search(&security) {
            list.insert(pos, security);
        }
    }

    pub fn sector(&self, security: &str) -> Option<Sector> {
        self.security_to_sector.get(security).copied()
    }

    /// Securities in a sector, sorted by id.
    pub fn securities_in_sector(&self, sector: Sector) -> &[SecurityId] {
        self.sector_to_securities
            .get(&sector)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All mapped securities, sorted by id.
    pub fn securities(&self) -> impl Iterator<Item = &SecurityId> {
        self.security_to_sector.keys()
    }

    /// Sectors with at least one security.
    pub fn active_sectors(&self) -> impl Iterator<Item = Sector> + '_ {
        self.sector_to_securities
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(s, _)| *s)
    }

    pub fn len(&self) -> usize {
        self.security_to_sector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.security_to_sector.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut model = SectorModel::new();
        model.add("MSFT", Sector::InformationTechnology);
        model.add("AAPL", Sector::InformationTechnology);
        model.add("XOM", Sector::Energy);

        assert_eq!(model.sector("XOM"), Some(Sector::Energy));
        assert_eq!(model.sector("GOOG"), None);
        assert_eq!(
            model.securities_in_sector(Sector::InformationTechnology),
            &["AAPL".to_string(), "MSFT".to_string()]
        );
    }

    #[test]
    fn test_reassign_moves_security() {
        let mut model = SectorModel::new();
        model.add("META", Sector::InformationTechnology);
        model.add("META", Sector::CommunicationServices);
        assert!(model.securities_in_sector(Sector::InformationTechnology).is_empty());
        assert_eq!(model.active_sectors().collect::<Vec<_>>(), vec![Sector::CommunicationServices]);
        assert_eq!(model.len(), 1);
    }
}
