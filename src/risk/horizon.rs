//! Holding-horizon risk.
//!
//! # Algorithm
//!
//! For each horizon of `w` trading days:
//!
//! 1. Slide a window of `w` consecutive portfolio returns over the series
//! 2. Compound each window: `Π (1 + r) - 1`
//! 3. Report the worst compounded return and the fraction of windows that
//!    lost money
//!
//! A horizon is only reported when its window is strictly shorter than the
//! series, so every reported row is backed by at least two windows.

use tracing::debug;

use crate::types::error::{XRayError, XRayResult};
use crate::types::table::ReturnSeries;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named holding period measured in trading days.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::risk::Horizon;
///
/// let horizon = Horizon::new("1 Quarter", 63).unwrap();
/// assert_eq!(horizon.window, 63);
/// assert!(Horizon::new("Never", 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Horizon {
    /// Display label, e.g. "1 Year".
    pub label: String,
    /// Window length in trading days.
    pub window: usize,
}

impl Horizon {
    /// Creates a new horizon.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::InvalidConfiguration` if the label is blank or the
    /// window is zero.
    pub fn new(label: impl Into<String>, window: usize) -> XRayResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(XRayError::InvalidConfiguration(
                "horizon label must not be blank".to_string(),
            ));
        }
        if window == 0 {
            return Err(XRayError::InvalidConfiguration(format!(
                "horizon {} must span at least one trading day",
                label
            )));
        }
        Ok(Self { label, window })
    }

    /// Standard horizons: 1 Month, 6 Months, 1 Year and 3 Years.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [
            ("1 Month", 21),
            ("6 Months", 126),
            ("1 Year", 252),
            ("3 Years", 756),
        ]
        .into_iter()
        .map(|(label, window)| Self {
            label: label.to_string(),
            window,
        })
        .collect()
    }
}

/// Risk statistics for one horizon.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HorizonMetric {
    /// Horizon label.
    pub horizon: String,
    /// Window length in trading days.
    pub window: usize,
    /// Worst compounded return over any window.
    pub worst_return: f64,
    /// Fraction of windows with a negative compounded return.
    pub probability_of_loss: f64,
    /// Number of windows evaluated.
    pub windows: usize,
}

/// Summarizes worst-case return and probability of loss per horizon.
///
/// Output rows follow the order of `horizons`, skipping those whose window is
/// not strictly shorter than the series.
///
/// # Errors
///
/// Returns `XRayError::InsufficientData` if no horizon fits the series.
///
/// # Example
///
/// ```rust
/// use chrono::{Days, NaiveDate};
/// use portfolio_xray::risk::{horizon_risk_summary, Horizon};
/// use portfolio_xray::types::ReturnSeries;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let dates = (0..5).map(|i| start + Days::new(i)).collect();
/// let series = ReturnSeries::new(dates, vec![0.01, -0.02, 0.03, -0.01, 0.02]).unwrap();
///
/// let rows = horizon_risk_summary(&series, &[Horizon::new("2 Days", 2).unwrap()]).unwrap();
/// assert_eq!(rows[0].windows, 4);
/// ```
pub fn horizon_risk_summary(
    portfolio_returns: &ReturnSeries,
    horizons: &[Horizon],
) -> XRayResult<Vec<HorizonMetric>> {
    let values = portfolio_returns.values();
    let n = values.len();

    let metrics: Vec<HorizonMetric> = horizons
        .iter()
        .filter(|h| {
            let fits = h.window > 0 && h.window < n;
            if !fits {
                debug!(horizon = %h.label, window = h.window, samples = n, "horizon excluded");
            }
            fits
        })
        .map(|h| summarize_window(&h.label, h.window, values))
        .collect();

    if metrics.is_empty() {
        return Err(XRayError::InsufficientData(format!(
            "horizon: no horizon fits {} portfolio returns",
            n
        )));
    }

    Ok(metrics)
}

fn summarize_window(label: &str, window: usize, values: &[f64]) -> HorizonMetric {
    let compounded: Vec<f64> = values
        .windows(window)
        .map(|w| w.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0)
        .collect();

    let losses = compounded.iter().filter(|r| **r < 0.0).count();
    let worst_return = compounded.iter().copied().fold(f64::INFINITY, f64::min);

    HorizonMetric {
        horizon: label.to_string(),
        window,
        worst_return,
        probability_of_loss: losses as f64 / compounded.len() as f64,
        windows: compounded.len(),
    }
}
