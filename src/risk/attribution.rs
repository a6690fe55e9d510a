//! Stress-loss attribution.
//!
//! Each asset's contribution over the stress dates is its weighted return
//! summed across those dates:
//!
//! ```text
//! C[a] = Σ_{t ∈ stress} r[t, a] × w[a] / 100
//! ```
//!
//! Contributions use the same weight units as the portfolio return series,
//! so `Σ C[a]` equals the sum of portfolio returns over the stress dates.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::portfolio::Weights;
use crate::types::table::ReturnsTable;
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-asset contribution to portfolio return on stress dates, most negative
/// first.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StressContribution {
    contributions: Vec<(Ticker, f64)>,
}

impl StressContribution {
    /// Returns the contributions in ascending order.
    #[must_use]
    pub fn contributions(&self) -> &[(Ticker, f64)] {
        &self.contributions
    }

    /// Returns the contribution of a ticker.
    #[must_use]
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|(t, _)| t.as_str() == ticker)
            .map(|(_, c)| *c)
    }

    /// Returns the sum of all contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|(_, c)| c).sum()
    }

    /// Returns the most negative contribution.
    #[must_use]
    pub fn largest_loss(&self) -> Option<(&Ticker, f64)> {
        self.contributions.first().map(|(t, c)| (t, *c))
    }

    /// Iterates over `(ticker, contribution)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, f64)> {
        self.contributions.iter().map(|(t, c)| (t, *c))
    }

    /// Returns the number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    /// Returns true if there are no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

/// Attributes stress-date portfolio return to individual assets.
///
/// An empty stress set is not an error: every contribution is zero.
#[must_use]
pub fn stress_loss_attribution(
    asset_returns: &ReturnsTable,
    weights: &Weights,
    stress_dates: &BTreeSet<NaiveDate>,
) -> StressContribution {
    let stressed = asset_returns.restrict_to(stress_dates);

    let mut contributions: Vec<(Ticker, f64)> = stressed
        .columns()
        .map(|(ticker, column)| {
            let weight = weights.fraction(ticker.as_str());
            let sum: f64 = column.iter().map(|r| r * weight).sum();
            (ticker.clone(), sum)
        })
        .collect();

    // Stable: equal contributions keep table order
    contributions.sort_by(|a, b| a.1.total_cmp(&b.1));

    StressContribution { contributions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn returns() -> ReturnsTable {
        ReturnsTable::new(
            vec![day(1), day(2), day(3)],
            vec![Ticker::new("A"), Ticker::new("B"), Ticker::new("C")],
            vec![
                vec![-0.02, 0.01, -0.04],
                vec![-0.01, 0.02, 0.01],
                vec![0.00, 0.00, 0.00],
            ],
        )
        .unwrap()
    }

    fn weights() -> Weights {
        Weights::from_percentages([
            (Ticker::new("A"), 50.0),
            (Ticker::new("B"), 30.0),
            (Ticker::new("C"), 20.0),
        ])
    }

    #[test]
    fn test_contributions_sorted_ascending() {
        let stress: BTreeSet<NaiveDate> = [day(1), day(3)].into_iter().collect();
        let result = stress_loss_attribution(&returns(), &weights(), &stress);

        // A: (-0.02 - 0.04) * 0.5, B: (-0.01 + 0.01) * 0.3, C: 0
        assert_relative_eq!(result.get("A").unwrap(), -0.03, epsilon = 1e-12);
        assert_relative_eq!(result.get("B").unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(result.largest_loss().unwrap().0, &Ticker::new("A"));

        let values: Vec<f64> = result.iter().map(|(_, c)| c).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_total_matches_portfolio_stress_return() {
        let stress: BTreeSet<NaiveDate> = [day(1), day(3)].into_iter().collect();
        let result = stress_loss_attribution(&returns(), &weights(), &stress);

        let portfolio = crate::risk::compute_portfolio_returns(&returns(), &weights());
        let expected: f64 = stress.iter().filter_map(|d| portfolio.get(*d)).sum();
        assert_relative_eq!(result.total(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_stress_dates_all_zero() {
        let result = stress_loss_attribution(&returns(), &weights(), &BTreeSet::new());
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|(_, c)| c == 0.0));
        assert_eq!(result.total(), 0.0);
    }

    #[test]
    fn test_unweighted_ticker_contributes_zero() {
        let stress: BTreeSet<NaiveDate> = [day(1)].into_iter().collect();
        let weights = Weights::from_percentages([(Ticker::new("A"), 100.0)]);
        let result = stress_loss_attribution(&returns(), &weights, &stress);

        assert_eq!(result.get("B"), Some(0.0));
        assert_relative_eq!(result.total(), -0.02, epsilon = 1e-12);
    }
}
