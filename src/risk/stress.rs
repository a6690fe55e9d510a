//! Stress period identification.
//!
//! A date is a stress date when the portfolio return on that date is at or
//! below the lower `q` quantile of all portfolio returns. The quantile uses
//! linear interpolation between order statistics:
//!
//! ```text
//! h = q × (n - 1)
//! Q(q) = x[⌊h⌋] + (h - ⌊h⌋) × (x[⌊h⌋ + 1] - x[⌊h⌋])
//! ```

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::types::error::{XRayError, XRayResult};
use crate::types::table::ReturnSeries;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default lower-tail probability used to classify stress dates.
pub const DEFAULT_STRESS_QUANTILE: f64 = 0.10;

/// Stress dates together with the threshold that selected them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StressPeriods {
    /// Lower-tail probability.
    pub quantile: f64,
    /// Portfolio return at that quantile.
    pub threshold: f64,
    /// Dates whose portfolio return is at or below the threshold.
    pub dates: BTreeSet<NaiveDate>,
}

impl StressPeriods {
    /// Returns the number of stress dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if no date is stressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns true if the date is a stress date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Classifies the dates of a portfolio return series into stress dates.
///
/// # Errors
///
/// Returns:
/// - `XRayError::Validation` if `quantile` is not a finite value in \[0, 1\]
/// - `XRayError::EmptyData` if the series is empty
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::risk::identify_stress_periods;
/// use portfolio_xray::types::ReturnSeries;
///
/// let dates: Vec<NaiveDate> = (1..=10)
///     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
///     .collect();
/// let values = vec![0.01, -0.03, 0.02, 0.00, -0.01, 0.015, 0.005, -0.002, 0.01, 0.02];
/// let series = ReturnSeries::new(dates.clone(), values).unwrap();
///
/// let stress = identify_stress_periods(&series, 0.10).unwrap();
/// assert!(stress.contains(dates[1]));
/// ```
pub fn identify_stress_periods(
    portfolio_returns: &ReturnSeries,
    quantile: f64,
) -> XRayResult<StressPeriods> {
    if !quantile.is_finite() || !(0.0..=1.0).contains(&quantile) {
        return Err(XRayError::Validation(format!(
            "stress quantile must be in [0, 1], got {}",
            quantile
        )));
    }

    if portfolio_returns.is_empty() {
        return Err(XRayError::EmptyData(
            "stress: portfolio return series is empty".to_string(),
        ));
    }

    let threshold = linear_quantile(portfolio_returns.values(), quantile);
    let dates = portfolio_returns
        .iter()
        .filter(|(_, r)| *r <= threshold)
        .map(|(date, _)| date)
        .collect();

    Ok(StressPeriods {
        quantile,
        threshold,
        dates,
    })
}

/// Sample quantile with linear interpolation. `values` must be non-empty.
pub(crate) fn linear_quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = q * (sorted.len() - 1) as f64;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = h - lower as f64;

    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}
