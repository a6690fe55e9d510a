//! Analysis configuration.

use std::collections::HashSet;

use crate::data::{DEFAULT_FILL_LIMIT, DateRange};
use crate::risk::{DEFAULT_STRESS_QUANTILE, Horizon};
use crate::types::error::{XRayError, XRayResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of one X-ray run.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::analysis::AnalysisConfig;
/// use portfolio_xray::risk::Horizon;
///
/// let config = AnalysisConfig::default()
///     .with_stress_quantile(0.05)
///     .with_horizons(vec![Horizon::new("1 Quarter", 63).unwrap()]);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.stress_quantile, 0.05);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Lower-tail probability that classifies stress dates.
    pub stress_quantile: f64,
    /// Holding horizons to summarize.
    pub horizons: Vec<Horizon>,
    /// Price history window.
    pub range: DateRange,
    /// Maximum consecutive missing prices filled per gap, `None` for no cap.
    pub fill_limit: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stress_quantile: DEFAULT_STRESS_QUANTILE,
            horizons: Horizon::defaults(),
            range: DateRange::default(),
            fill_limit: Some(DEFAULT_FILL_LIMIT),
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stress quantile.
    #[must_use]
    pub fn with_stress_quantile(mut self, quantile: f64) -> Self {
        self.stress_quantile = quantile;
        self
    }

    /// Sets the horizons.
    #[must_use]
    pub fn with_horizons(mut self, horizons: Vec<Horizon>) -> Self {
        self.horizons = horizons;
        self
    }

    /// Sets the price history window.
    #[must_use]
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Sets the forward-fill cap.
    #[must_use]
    pub fn with_fill_limit(mut self, limit: Option<usize>) -> Self {
        self.fill_limit = limit;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::InvalidConfiguration` if:
    /// - The stress quantile is not a finite value in \[0, 1\]
    /// - No horizon is configured
    /// - A horizon has a blank label or a zero-length window
    /// - Two horizons share a label
    /// - The date range ends before it starts
    pub fn validate(&self) -> XRayResult<()> {
        if !self.stress_quantile.is_finite() || !(0.0..=1.0).contains(&self.stress_quantile) {
            return Err(XRayError::InvalidConfiguration(format!(
                "stress_quantile must be in [0, 1], got {}",
                self.stress_quantile
            )));
        }

        if self.horizons.is_empty() {
            return Err(XRayError::InvalidConfiguration(
                "at least one horizon is required".to_string(),
            ));
        }

        let mut labels = HashSet::new();
        for horizon in &self.horizons {
            Horizon::new(horizon.label.as_str(), horizon.window)?;
            if !labels.insert(horizon.label.as_str()) {
                return Err(XRayError::InvalidConfiguration(format!(
                    "duplicate horizon label: {}",
                    horizon.label
                )));
            }
        }

        DateRange::new(self.range.start, self.range.end)?;
        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::InvalidConfiguration` if the JSON is malformed or
    /// the parsed values fail [`validate`](Self::validate).
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> XRayResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| XRayError::InvalidConfiguration(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stress_quantile, 0.10);
        assert_eq!(config.horizons.len(), 4);
        assert_eq!(config.fill_limit, Some(5));
        assert_eq!(
            config.range.start,
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_builders() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let config = AnalysisConfig::new()
            .with_stress_quantile(0.2)
            .with_range(DateRange::since(start))
            .with_fill_limit(None);

        assert_eq!(config.stress_quantile, 0.2);
        assert_eq!(config.range.start, start);
        assert_eq!(config.fill_limit, None);
    }

    #[test]
    fn test_invalid_quantile() {
        for q in [-0.01, 1.01, f64::NAN] {
            let config = AnalysisConfig::default().with_stress_quantile(q);
            assert!(matches!(
                config.validate(),
                Err(XRayError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_invalid_horizons() {
        let empty = AnalysisConfig::default().with_horizons(vec![]);
        assert!(empty.validate().is_err());

        let zero = AnalysisConfig::default().with_horizons(vec![Horizon {
            label: "Zero".to_string(),
            window: 0,
        }]);
        assert!(matches!(
            zero.validate(),
            Err(XRayError::InvalidConfiguration(_))
        ));

        let duplicate = AnalysisConfig::default().with_horizons(vec![
            Horizon::new("1 Year", 252).unwrap(),
            Horizon::new("1 Year", 250).unwrap(),
        ]);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_invalid_range() {
        let mut config = AnalysisConfig::default();
        config.range.end = NaiveDate::from_ymd_opt(2010, 1, 1);
        assert!(matches!(
            config.validate(),
            Err(XRayError::InvalidConfiguration(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let json = r#"{
            "stress_quantile": 0.05,
            "horizons": [{"label": "1 Month", "window": 21}],
            "range": {"start": "2019-01-01", "end": null},
            "fill_limit": 3
        }"#;
        let config = AnalysisConfig::from_json(json).unwrap();

        assert_eq!(config.stress_quantile, 0.05);
        assert_eq!(config.horizons.len(), 1);
        assert_eq!(config.fill_limit, Some(3));
        assert_eq!(
            config.range.start,
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_partial_uses_defaults() {
        let config = AnalysisConfig::from_json(r#"{"stress_quantile": 0.2}"#).unwrap();
        assert_eq!(config.horizons, Horizon::defaults());
        assert_eq!(config.range, DateRange::default());
        assert_eq!(config.fill_limit, Some(DEFAULT_FILL_LIMIT));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            AnalysisConfig::from_json("{not json"),
            Err(XRayError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"stress_quantile": 2.0}"#),
            Err(XRayError::InvalidConfiguration(_))
        ));
    }
}
