//! Market-side classifications: sectors, event types, data fields.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Sector
// =============================================================================

/// GICS sector classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    CommunicationServices,
    ConsumerDiscretionary,
    ConsumerStaples,
    Energy,
    Financials,
    HealthCare,
    Industrials,
    InformationTechnology,
    Materials,
    RealEstate,
    Utilities,
}

impl Sector {
    /// All eleven sectors in declaration order.
    pub fn all() -> &'static [Sector] {
        &[
            Sector::CommunicationServices,
            Sector::ConsumerDiscretionary,
            Sector::ConsumerStaples,
            Sector::Energy,
            Sector::Financials,
            Sector::HealthCare,
            Sector::Industrials,
            Sector::InformationTechnology,
            Sector::Materials,
            Sector::RealEstate,
            Sector::Utilities,
        ]
    }

    /// Official GICS display name.
    pub fn name(self) -> &'static str {
        match self {
            Sector::CommunicationServices => "Communication Services",
            Sector::ConsumerDiscretionary => "Consumer Discretionary",
            Sector::ConsumerStaples => "Consumer Staples",
            Sector::Energy => "Energy",
            Sector::Financials => "Financials",
            Sector::HealthCare => "Health Care",
            Sector::Industrials => "Industrials",
            Sector::InformationTechnology => "Information Technology",
            Sector::Materials => "Materials",
            Sector::RealEstate => "Real Estate",
            Sector::Utilities => "Utilities",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// EventType
// =============================================================================

/// Kind of market or corporate event in the input feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    EarningsAnnouncement,
    GuidanceUpdate,
    ManagementChange,
    MergerAcquisition,
    DividendAnnouncement,
    ConferenceCall,
    InvestorDay,
    RegulatoryNews,
    SectorNews,
    MarketMovement,
}

impl EventType {
    /// Events that move fundamentals enough to justify a target-price revision.
    pub fn is_fundamental(self) -> bool {
        matches!(
            self,
            EventType::EarningsAnnouncement
                | EventType::GuidanceUpdate
                | EventType::MergerAcquisition
        )
    }
}

// =============================================================================
// Field
// =============================================================================

/// Time-series field served by the market/fundamental provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Closing price.
    Price,
    /// Reported earnings per share.
    Eps,
    /// Reported revenue.
    Revenue,
}
