//! Seeded synthetic market generator.
//!
//! Produces a coherent price/EPS history and the matching event feed for a
//! configurable universe. Earnings surprises and guidance changes move the
//! price on the event date, so realized outcomes downstream of an event are
//! consistent with its sign.
//!
//! ```ignore
//! let market = SyntheticMarketGenerator::new(SyntheticMarketConfig::default(), 42).generate()?;
//! let events = market.feed.events();
//! ```

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use types::time::start_of_day;
use types::{EventType, Field, SecurityId, Sector, Timestamp};

use crate::config::{RandomEventConfig, SyntheticMarketConfig};
use crate::error::Result;
use crate::events::{EventFeed, MarketEvent};
use crate::provider::InMemoryProvider;
use crate::sectors::SectorModel;

const TRADING_DAYS_PER_YEAR: f64 = 365.0;
const REVENUE_PER_EPS: (f64, f64) = (20.0, 40.0);

const CORPORATE_EVENTS: &[EventType] = &[
    EventType::ManagementChange,
    EventType::DividendAnnouncement,
    EventType::ConferenceCall,
    EventType::InvestorDay,
    EventType::RegulatoryNews,
];

/// Generated feed plus the provider holding the underlying series.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    pub feed: EventFeed,
    pub provider: InMemoryProvider,
}

/// Event before ids are assigned.
struct Draft {
    timestamp: Timestamp,
    security: SecurityId,
    event_type: EventType,
    magnitude: f64,
    payload: Vec<(&'static str, f64)>,
}

// =============================================================================
// SyntheticMarketGenerator
// =============================================================================

/// Deterministic generator: the same config and seed always give the same market.
pub struct SyntheticMarketGenerator {
    config: SyntheticMarketConfig,
    rng: StdRng,
}

impl SyntheticMarketGenerator {
    pub fn new(config: SyntheticMarketConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &SyntheticMarketConfig {
        &self.config
    }

    fn universe(&self) -> Vec<(SecurityId, Sector)> {
        let sectors: &[Sector] = if self.config.sectors.is_empty() {
            Sector::all()
        } else {
            &self.config.sectors
        };
        (0..self.config.securities)
            .map(|i| (format!("SEC{:03}", i + 1), sectors[i % sectors.len()]))
            .collect()
    }

    fn uniform(&mut self, (lo, hi): (f64, f64)) -> f64 {
        if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        }
    }

    fn signed_magnitude(&mut self, family: &RandomEventConfig) -> f64 {
        let abs = self.uniform((family.magnitude.min, family.magnitude.max));
        if self.rng.random_bool(0.5) { abs } else { -abs }
    }

    /// Daily random draw honoring probability and minimum spacing.
    fn fires(&mut self, family: &RandomEventConfig, day: NaiveDate, last: Option<NaiveDate>) -> bool {
        let freq = &family.frequency;
        if !freq.enabled || freq.probability_per_day <= 0.0 {
            return false;
        }
        if let Some(last) = last
            && (day - last).num_days() < freq.min_interval_days
        {
            return false;
        }
        self.rng.random_bool(freq.probability_per_day)
    }

    /// Sector news dates per sector, drawn before any security is processed.
    fn sector_news(&mut self, sectors: &[Sector]) -> Vec<(Sector, NaiveDate, f64)> {
        let family = self.config.sector_news.clone();
        let mut out = Vec::new();
        for &sector in sectors {
            let mut last = None;
            let mut day = self.config.start;
            while day <= self.config.end {
                if self.fires(&family, day, last) {
                    let magnitude = self.signed_magnitude(&family);
                    out.push((sector, day, magnitude));
                    last = Some(day);
                }
                day += Duration::days(1);
            }
        }
        out
    }

    /// Report dates for every quarter whose report falls inside the event window.
    fn earnings_dates(&mut self) -> Vec<NaiveDate> {
        let (lo, hi) = self.config.earnings.report_offset_days;
        let offset = if hi > lo {
            self.rng.random_range(lo..=hi)
        } else {
            lo
        };
        let start = self.config.start;
        let mut dates = Vec::new();
        let (mut year, mut quarter) = (start.year(), (start.month0() / 3) as i32);
        loop {
            let Some(quarter_start) = NaiveDate::from_ymd_opt(year, quarter as u32 * 3 + 1, 1)
            else {
                break;
            };
            let report = quarter_start + Duration::days(offset);
            if report > self.config.end {
                break;
            }
            if report >= start {
                dates.push(report);
            }
            quarter += 1;
            if quarter == 4 {
                quarter = 0;
                year += 1;
            }
        }
        dates
    }

    /// Generate the full market.
    pub fn generate(mut self) -> Result<SyntheticMarket> {
        self.config.validate()?;
        let universe = self.universe();

        let mut sector_model = SectorModel::new();
        for (security, sector) in &universe {
            sector_model.add(security.clone(), *sector);
        }
        let active_sectors: Vec<Sector> = sector_model.active_sectors().collect();
        let sector_news = self.sector_news(&active_sectors);

        let mut provider = InMemoryProvider::new().with_sectors(sector_model);
        let mut drafts = Vec::new();
        for (security, sector) in &universe {
            self.generate_security(security, *sector, &sector_news, &mut provider, &mut drafts)?;
        }

        drafts.sort_by(|a, b| {
            (a.timestamp, &a.security, a.event_type).cmp(&(b.timestamp, &b.security, b.event_type))
        });
        let events = drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                d.payload.into_iter().fold(
                    MarketEvent::new(
                        i as u64 + 1,
                        d.timestamp,
                        d.security,
                        d.event_type,
                        d.magnitude.clamp(-1.0, 1.0),
                    ),
                    |event, (k, v)| event.with_payload(k, v),
                )
            })
            .collect();

        Ok(SyntheticMarket {
            feed: EventFeed::new(events)?,
            provider,
        })
    }

    fn generate_security(
        &mut self,
        security: &SecurityId,
        sector: Sector,
        sector_news: &[(Sector, NaiveDate, f64)],
        provider: &mut InMemoryProvider,
        drafts: &mut Vec<Draft>,
    ) -> Result<()> {
        let cfg = self.config.clone();
        let dt = 1.0 / TRADING_DAYS_PER_YEAR;
        let sigma = cfg.price.annual_volatility;
        let drift = (cfg.price.annual_drift - 0.5 * sigma * sigma) * dt;
        let diffusion = sigma * dt.sqrt();

        let mut price = self.uniform(cfg.price.initial_range);
        let mut eps = self.uniform(cfg.earnings.initial_eps_range);
        let revenue_multiple = self.uniform(REVENUE_PER_EPS);
        let earnings_dates = if cfg.earnings.enabled {
            self.earnings_dates()
        } else {
            Vec::new()
        };

        let last_day = cfg.end + Duration::days(cfg.padding_days);
        provider.insert(security.clone(), Field::Eps, cfg.start, eps)?;
        provider.insert(security.clone(), Field::Revenue, cfg.start, eps * revenue_multiple)?;

        let mut last_guidance = None;
        let mut last_corporate = None;
        let mut day = cfg.start;
        while day <= last_day {
            let in_window = day <= cfg.end;
            let z: f64 = StandardNormal.sample(&mut self.rng);
            let mut daily_return = (drift + diffusion * z).exp() - 1.0;

            if earnings_dates.contains(&day) {
                let surprise = self.uniform(cfg.earnings.surprise_range);
                let expected = eps * (1.0 + cfg.earnings.expected_growth);
                eps = expected * (1.0 + surprise);
                daily_return += cfg.earnings.price_sensitivity * surprise;
                provider.insert(security.clone(), Field::Eps, day, eps)?;
                provider.insert(security.clone(), Field::Revenue, day, eps * revenue_multiple)?;
                drafts.push(Draft {
                    timestamp: start_of_day(day) + Duration::hours(12),
                    security: security.clone(),
                    event_type: EventType::EarningsAnnouncement,
                    magnitude: surprise * cfg.earnings.magnitude_per_surprise,
                    payload: vec![
                        ("surprise_pct", surprise),
                        ("eps_actual", eps),
                        ("eps_expected", expected),
                    ],
                });
            }

            if in_window && self.fires(&cfg.guidance, day, last_guidance) {
                let magnitude = self.signed_magnitude(&cfg.guidance);
                daily_return += cfg.guidance.price_impact * magnitude;
                last_guidance = Some(day);
                drafts.push(Draft {
                    timestamp: start_of_day(day) + Duration::hours(14),
                    security: security.clone(),
                    event_type: EventType::GuidanceUpdate,
                    magnitude,
                    payload: vec![("growth_revision", magnitude * 0.1)],
                });
            }

            if in_window && self.fires(&cfg.corporate, day, last_corporate) {
                let magnitude = self.signed_magnitude(&cfg.corporate);
                let kind = CORPORATE_EVENTS[self.rng.random_range(0..CORPORATE_EVENTS.len())];
                daily_return += cfg.corporate.price_impact * magnitude;
                last_corporate = Some(day);
                drafts.push(Draft {
                    timestamp: start_of_day(day) + Duration::hours(15),
                    security: security.clone(),
                    event_type: kind,
                    magnitude,
                    payload: Vec::new(),
                });
            }

            if in_window {
                for (_, _, magnitude) in sector_news
                    .iter()
                    .filter(|(s, d, _)| *s == sector && *d == day)
                {
                    daily_return += cfg.sector_news.price_impact * magnitude;
                    drafts.push(Draft {
                        timestamp: start_of_day(day) + Duration::hours(13),
                        security: security.clone(),
                        event_type: EventType::SectorNews,
                        magnitude: *magnitude,
                        payload: Vec::new(),
                    });
                }
            }

            price = (price * (1.0 + daily_return)).max(0.01);
            provider.insert(security.clone(), Field::Price, day, price)?;

            if in_window && daily_return.abs() >= cfg.price.movement_threshold {
                drafts.push(Draft {
                    timestamp: start_of_day(day) + Duration::hours(21),
                    security: security.clone(),
                    event_type: EventType::MarketMovement,
                    magnitude: (daily_return * 5.0).clamp(-1.0, 1.0),
                    payload: vec![("daily_return", daily_return)],
                });
            }

            day += Duration::days(1);
        }
        Ok(())
    }
}
