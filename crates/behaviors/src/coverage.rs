//! Coverage policy: how many ideas an analyst carries at once.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, check_unit};

const COMPONENT: &str = "coverage";

/// Declarative coverage parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageParams {
    /// Hard cap on simultaneously open (non-terminal) ideas.
    pub max_active_coverage: usize,
    /// Comfortable working size; appetite for new ideas drops beyond it.
    pub ideal_coverage_size: usize,
    /// 0.0 = breadth (many shallow ideas), 1.0 = depth (few deep ideas).
    pub depth_vs_breadth_preference: f64,
    /// Maximum share of `max_active_coverage` that may sit in one sector.
    pub sector_concentration_limit: f64,
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self {
            max_active_coverage: 20,
            ideal_coverage_size: 15,
            depth_vs_breadth_preference: 0.5,
            sector_concentration_limit: 0.6,
        }
    }
}

/// Validated coverage policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoverageParams", into = "CoverageParams")]
pub struct CoverageBehavior {
    params: CoverageParams,
}

impl CoverageBehavior {
    pub fn new(params: CoverageParams) -> Result<Self> {
        if params.max_active_coverage == 0 {
            return Err(ValidationError::new(
                COMPONENT,
                "max_active_coverage",
                params.max_active_coverage,
                "must be >= 1",
            ));
        }
        if params.ideal_coverage_size == 0 || params.ideal_coverage_size > params.max_active_coverage
        {
            return Err(ValidationError::new(
                COMPONENT,
                "ideal_coverage_size",
                params.ideal_coverage_size,
                format!("must be within 1..={}", params.max_active_coverage),
            ));
        }
        check_unit(
            COMPONENT,
            "depth_vs_breadth_preference",
            params.depth_vs_breadth_preference,
        )?;
        let limit = params.sector_concentration_limit;
        if !(limit > 0.0 && limit <= 1.0) {
            return Err(ValidationError::new(
                COMPONENT,
                "sector_concentration_limit",
                limit,
                "must be within (0, 1]",
            ));
        }
        Ok(Self { params })
    }

    /// Build with just the two size parameters, defaults elsewhere.
    pub fn with_sizes(max_active_coverage: usize, ideal_coverage_size: usize) -> Result<Self> {
        Self::new(CoverageParams {
            max_active_coverage,
            ideal_coverage_size,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &CoverageParams {
        &self.params
    }

    pub fn max_active_coverage(&self) -> usize {
        self.params.max_active_coverage
    }

    pub fn ideal_coverage_size(&self) -> usize {
        self.params.ideal_coverage_size
    }

    pub fn depth_preference(&self) -> f64 {
        self.params.depth_vs_breadth_preference
    }

    /// Capacity predicate consulted before every new idea.
    pub fn has_capacity(&self, active_ideas: usize) -> bool {
        active_ideas < self.params.max_active_coverage
    }

    /// Willingness (0.0 to 1.0) to open another idea at the current load.
    pub fn new_idea_appetite(&self, active_ideas: usize) -> f64 {
        if !self.has_capacity(active_ideas) {
            return 0.0;
        }
        let depth = self.params.depth_vs_breadth_preference;
        let ideal = self.params.ideal_coverage_size as f64;
        let active = active_ideas as f64;
        if active_ideas < self.params.ideal_coverage_size {
            1.0 - 0.5 * depth * (active / ideal)
        } else {
            let max = self.params.max_active_coverage as f64;
            (1.0 - depth) * (max - active) / (max - ideal + 1.0)
        }
    }

    /// Maximum number of open ideas allowed in a single sector.
    pub fn sector_cap(&self) -> usize {
        let cap = (self.params.sector_concentration_limit * self.params.max_active_coverage as f64)
            .ceil() as usize;
        cap.max(1)
    }

    /// Whether one more idea in a sector that already holds `in_sector` fits.
    pub fn within_sector_limit(&self, in_sector: usize) -> bool {
        in_sector < self.sector_cap()
    }
}

impl TryFrom<CoverageParams> for CoverageBehavior {
    type Error = ValidationError;

    fn try_from(params: CoverageParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<CoverageBehavior> for CoverageParams {
    fn from(behavior: CoverageBehavior) -> Self {
        behavior.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_predicate() {
        let coverage = CoverageBehavior::with_sizes(3, 2).unwrap();
        assert!(coverage.has_capacity(0));
        assert!(coverage.has_capacity(2));
        assert!(!coverage.has_capacity(3));
        assert_eq!(coverage.new_idea_appetite(3), 0.0);
    }

    #[test]
    fn test_appetite_declines_with_load() {
        let coverage = CoverageBehavior::new(CoverageParams {
            max_active_coverage: 10,
            ideal_coverage_size: 6,
            depth_vs_breadth_preference: 0.8,
            sector_concentration_limit: 1.0,
        })
        .unwrap();
        let mut last = f64::INFINITY;
        for active in 0..=10 {
            let appetite = coverage.new_idea_appetite(active);
            assert!((0.0..=1.0).contains(&appetite));
            assert!(appetite <= last);
            last = appetite;
        }
    }

    #[test]
    fn test_sector_limit() {
        let coverage = CoverageBehavior::new(CoverageParams {
            max_active_coverage: 10,
            ideal_coverage_size: 5,
            depth_vs_breadth_preference: 0.5,
            sector_concentration_limit: 0.3,
        })
        .unwrap();
        assert_eq!(coverage.sector_cap(), 3);
        assert!(coverage.within_sector_limit(2));
        assert!(!coverage.within_sector_limit(3));
    }

    #[test]
    fn test_rejects_ideal_above_max() {
        let err = CoverageBehavior::with_sizes(5, 8).unwrap_err();
        assert_eq!(err.parameter, "ideal_coverage_size");
        assert!(CoverageBehavior::with_sizes(0, 0).is_err());
    }
}
