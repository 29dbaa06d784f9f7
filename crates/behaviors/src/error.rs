//! Parameter validation errors and range-check helpers.

use std::fmt;

/// Result type for behavior construction.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A behavior parameter was outside its allowed range.
///
/// Construction fails immediately; parameters are never clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {component}.{parameter} = {value}: {reason}")]
pub struct ValidationError {
    /// Behavior component being constructed (e.g. "accuracy").
    pub component: &'static str,
    /// Offending parameter name.
    pub parameter: String,
    /// Offending value, formatted.
    pub value: String,
    /// What the parameter must satisfy.
    pub reason: String,
}

impl ValidationError {
    pub fn new(
        component: &'static str,
        parameter: impl Into<String>,
        value: impl fmt::Debug,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            component,
            parameter: parameter.into(),
            value: format!("{value:?}"),
            reason: reason.into(),
        }
    }
}

/// Require a finite value within `[lo, hi]`.
pub(crate) fn check_range(
    component: &'static str,
    parameter: &str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<()> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ValidationError::new(
            component,
            parameter,
            value,
            format!("must be within [{lo}, {hi}]"),
        ))
    }
}

/// Require a finite value in `[0, 1]`.
pub(crate) fn check_unit(component: &'static str, parameter: &str, value: f64) -> Result<()> {
    check_range(component, parameter, value, 0.0, 1.0)
}

/// Require a finite, strictly positive value.
pub(crate) fn check_positive(component: &'static str, parameter: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            component,
            parameter,
            value,
            "must be finite and > 0",
        ))
    }
}

/// Require an ordered `(min, max)` pair with `floor <= min <= max`, both finite.
pub(crate) fn check_span(
    component: &'static str,
    parameter: &str,
    span: (f64, f64),
    floor: f64,
) -> Result<()> {
    let (min, max) = span;
    if min.is_finite() && max.is_finite() && min >= floor && min <= max {
        Ok(())
    } else {
        Err(ValidationError::new(
            component,
            parameter,
            span,
            format!("must satisfy {floor} <= min <= max"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(check_unit("accuracy", "mean", f64::NAN).is_err());
        assert!(check_unit("accuracy", "mean", 0.5).is_ok());
    }

    #[test]
    fn test_error_message_names_parameter() {
        let err = check_unit("timing", "event_sensitivity_threshold", 1.5).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("timing.event_sensitivity_threshold"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_check_span() {
        assert!(check_span("timing", "delay", (0.0, 3.0), 0.0).is_ok());
        assert!(check_span("timing", "delay", (3.0, 1.0), 0.0).is_err());
        assert!(check_span("timing", "delay", (-1.0, 1.0), 0.0).is_err());
    }
}
