//! Allocation weights keyed by ticker.

use std::collections::HashMap;

use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Allocation weights in percent (0–100), keyed by ticker.
///
/// Consumers re-align weights to whatever ticker set has data: a ticker with
/// no weight contributes zero, and a weight whose ticker has no data is
/// ignored.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::portfolio::Weights;
/// use portfolio_xray::types::Ticker;
///
/// let weights = Weights::from_percentages([(Ticker::new("A"), 60.0), (Ticker::new("B"), 40.0)]);
///
/// let aligned = weights.aligned_fractions(&[Ticker::new("B"), Ticker::new("C")]);
/// assert_eq!(aligned, vec![0.4, 0.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Weights {
    percentages: HashMap<Ticker, f64>,
}

impl Weights {
    /// Creates weights from `(ticker, percent)` pairs. Later duplicates win.
    #[must_use]
    pub fn from_percentages(pairs: impl IntoIterator<Item = (Ticker, f64)>) -> Self {
        Self {
            percentages: pairs.into_iter().collect(),
        }
    }

    /// Returns the weight of a ticker in percent.
    #[must_use]
    pub fn percent(&self, ticker: &str) -> Option<f64> {
        self.percentages.get(ticker).copied()
    }

    /// Returns the weight of a ticker as a fraction, zero when absent.
    #[must_use]
    pub fn fraction(&self, ticker: &str) -> f64 {
        self.percent(ticker).map_or(0.0, |pct| pct / 100.0)
    }

    /// Returns fractional weights re-aligned to `tickers`.
    #[must_use]
    pub fn aligned_fractions(&self, tickers: &[Ticker]) -> Vec<f64> {
        tickers.iter().map(|t| self.fraction(t.as_str())).collect()
    }

    /// Returns the number of weighted tickers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.percentages.len()
    }

    /// Returns true if no ticker is weighted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }
}
