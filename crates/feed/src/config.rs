//! Configuration for the synthetic market generator.
//!
//! Declarative: every event family has a frequency, magnitude band, and an
//! enable flag, so test scenarios can switch families off independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use types::Sector;

use crate::error::{FeedError, Result};

// =============================================================================
// EventFrequency
// =============================================================================

/// How often a family of random events occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrequency {
    /// Probability of an event on any given day (0.0 to 1.0).
    pub probability_per_day: f64,
    /// Minimum days between two events of this family for the same target.
    pub min_interval_days: i64,
    pub enabled: bool,
}

impl EventFrequency {
    pub fn new(probability_per_day: f64, min_interval_days: i64) -> Self {
        Self {
            probability_per_day: probability_per_day.clamp(0.0, 1.0),
            min_interval_days: min_interval_days.max(0),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            probability_per_day: 0.0,
            min_interval_days: 0,
            enabled: false,
        }
    }
}

/// Magnitude band (absolute value) for generated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeConfig {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeConfig {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: min.clamp(0.0, 1.0),
            max: max.clamp(0.0, 1.0),
        }
    }
}

impl Default for MagnitudeConfig {
    fn default() -> Self {
        Self { min: 0.05, max: 0.4 }
    }
}

// =============================================================================
// Price & Earnings
// =============================================================================

/// Geometric Brownian motion parameters for daily prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePathConfig {
    /// Range for the initial price of each security.
    pub initial_range: (f64, f64),
    /// Annualized drift.
    pub annual_drift: f64,
    /// Annualized volatility.
    pub annual_volatility: f64,
    /// Daily moves beyond this absolute return emit a `MarketMovement` event.
    pub movement_threshold: f64,
}

impl Default for PricePathConfig {
    fn default() -> Self {
        Self {
            initial_range: (20.0, 200.0),
            annual_drift: 0.06,
            annual_volatility: 0.25,
            movement_threshold: 0.05,
        }
    }
}

/// Quarterly earnings schedule and surprises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsConfig {
    pub enabled: bool,
    /// Surprise vs. expectation, e.g. `(-0.1, 0.1)`.
    pub surprise_range: (f64, f64),
    /// Quarter-over-quarter expected EPS growth.
    pub expected_growth: f64,
    /// Range for the starting quarterly EPS.
    pub initial_eps_range: (f64, f64),
    /// Price jump per unit of surprise on the report date.
    pub price_sensitivity: f64,
    /// Event magnitude per unit of surprise (clamped to 1.0).
    pub magnitude_per_surprise: f64,
    /// Report date offset after quarter start, in days, `(min, max)`.
    pub report_offset_days: (i64, i64),
}

impl Default for EarningsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            surprise_range: (-0.12, 0.12),
            expected_growth: 0.015,
            initial_eps_range: (0.5, 3.0),
            price_sensitivity: 0.8,
            magnitude_per_surprise: 4.0,
            report_offset_days: (20, 45),
        }
    }
}

// =============================================================================
// Random Event Families
// =============================================================================

/// Configuration for one family of random events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEventConfig {
    pub frequency: EventFrequency,
    pub magnitude: MagnitudeConfig,
    /// Price jump per unit of signed magnitude.
    pub price_impact: f64,
}

impl RandomEventConfig {
    pub fn new(frequency: EventFrequency, magnitude: MagnitudeConfig, price_impact: f64) -> Self {
        Self {
            frequency,
            magnitude,
            price_impact,
        }
    }

    pub fn disabled() -> Self {
        Self::new(EventFrequency::disabled(), MagnitudeConfig::default(), 0.0)
    }
}

// =============================================================================
// SyntheticMarketConfig
// =============================================================================

/// Top-level configuration for [`crate::SyntheticMarketGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMarketConfig {
    /// First day events may occur.
    pub start: NaiveDate,
    /// Last day events may occur (inclusive).
    pub end: NaiveDate,
    /// Prices and EPS keep being generated this many days past `end`, so
    /// forecasts made near the end still have a realized outcome.
    pub padding_days: i64,
    /// Number of securities to create.
    pub securities: usize,
    /// Sectors assigned round-robin; empty means all GICS sectors.
    pub sectors: Vec<Sector>,
    pub price: PricePathConfig,
    pub earnings: EarningsConfig,
    pub guidance: RandomEventConfig,
    pub sector_news: RandomEventConfig,
    /// Management changes, dividends, conference calls, investor days, regulatory news.
    pub corporate: RandomEventConfig,
}

impl Default for SyntheticMarketConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            padding_days: 400,
            securities: 40,
            sectors: Vec::new(),
            price: PricePathConfig::default(),
            earnings: EarningsConfig::default(),
            guidance: RandomEventConfig::new(
                EventFrequency::new(0.004, 60),
                MagnitudeConfig::new(0.05, 0.5),
                0.05,
            ),
            sector_news: RandomEventConfig::new(
                EventFrequency::new(0.02, 10),
                MagnitudeConfig::new(0.02, 0.3),
                0.02,
            ),
            corporate: RandomEventConfig::new(
                EventFrequency::new(0.01, 20),
                MagnitudeConfig::new(0.02, 0.35),
                0.01,
            ),
        }
    }
}

impl SyntheticMarketConfig {
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_securities(mut self, securities: usize) -> Self {
        self.securities = securities;
        self
    }

    pub fn with_sectors(mut self, sectors: Vec<Sector>) -> Self {
        self.sectors = sectors;
        self
    }

    pub fn with_padding_days(mut self, padding_days: i64) -> Self {
        self.padding_days = padding_days;
        self
    }

    pub fn with_earnings(mut self, earnings: EarningsConfig) -> Self {
        self.earnings = earnings;
        self
    }

    /// Only quarterly earnings; every random family disabled.
    pub fn earnings_only(mut self) -> Self {
        self.guidance = RandomEventConfig::disabled();
        self.sector_news = RandomEventConfig::disabled();
        self.corporate = RandomEventConfig::disabled();
        self.price.movement_threshold = f64::INFINITY;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FeedError::InvalidConfig(msg));
        if self.start >= self.end {
            return invalid(format!("start {} must precede end {}", self.start, self.end));
        }
        if self.securities == 0 {
            return invalid("at least one security is required".into());
        }
        if self.padding_days < 0 {
            return invalid("padding_days must be >= 0".into());
        }
        let ordered = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && lo <= hi;
        if !ordered(self.price.initial_range) || self.price.initial_range.0 <= 0.0 {
            return invalid("price.initial_range must be positive and ordered".into());
        }
        if !(self.price.annual_volatility.is_finite() && self.price.annual_volatility >= 0.0) {
            return invalid("price.annual_volatility must be >= 0".into());
        }
        if !ordered(self.earnings.surprise_range) || self.earnings.surprise_range.0 <= -1.0 {
            return invalid("earnings.surprise_range must be ordered and > -1".into());
        }
        if !ordered(self.earnings.initial_eps_range) || self.earnings.initial_eps_range.0 <= 0.0 {
            return invalid("earnings.initial_eps_range must be positive and ordered".into());
        }
        let (lo, hi) = self.earnings.report_offset_days;
        if !(0 <= lo && lo <= hi && hi < 90) {
            return invalid("earnings.report_offset_days must satisfy 0 <= min <= max < 90".into());
        }
        for (name, family) in [
            ("guidance", &self.guidance),
            ("sector_news", &self.sector_news),
            ("corporate", &self.corporate),
        ] {
            if family.magnitude.min > family.magnitude.max {
                return invalid(format!("{name}.magnitude min exceeds max"));
            }
        }
        Ok(())
    }
}
