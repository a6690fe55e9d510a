//! Portfolio construction and allocation weights.

use crate::Decimal;
use crate::portfolio::record::{AssetType, PortfolioRecord};
use crate::portfolio::weights::Weights;
use crate::types::decimal::decimal_to_f64;
use crate::types::error::{XRayError, XRayResult};
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A record annotated with its share of the portfolio.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Holding {
    /// The declared record.
    pub record: PortfolioRecord,
    /// `amount / total * 100`.
    pub allocation_pct: Decimal,
}

/// Validated portfolio with allocation percentages.
///
/// Allocations are derived from amounts and sum to 100. A portfolio is never
/// edited in place; [`Portfolio::with_amount`] rebuilds it.
///
/// # Example
///
/// ```rust
/// use portfolio_xray::portfolio::{build_portfolio, AssetType, PortfolioRecord};
/// use portfolio_xray::dec;
///
/// let portfolio = build_portfolio(vec![
///     PortfolioRecord::new("SPY", dec!(6000), AssetType::Etf),
///     PortfolioRecord::new("GLD", dec!(4000), AssetType::Gold),
/// ])
/// .unwrap();
///
/// assert_eq!(portfolio.allocation("SPY"), Some(dec!(60)));
/// assert_eq!(portfolio.total_amount(), dec!(10000));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Portfolio {
    holdings: Vec<Holding>,
    total_amount: Decimal,
}

impl Portfolio {
    /// Returns the holdings in declaration order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Returns the number of holdings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Always false: a built portfolio has at least one holding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Returns the sum of invested amounts.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Returns the tickers in declaration order.
    #[must_use]
    pub fn tickers(&self) -> Vec<Ticker> {
        self.holdings
            .iter()
            .map(|h| h.record.ticker.clone())
            .collect()
    }

    /// Returns the allocation percentage of a ticker.
    #[must_use]
    pub fn allocation(&self, ticker: &str) -> Option<Decimal> {
        self.holdings
            .iter()
            .find(|h| h.record.ticker.as_str() == ticker)
            .map(|h| h.allocation_pct)
    }

    /// Returns the combined allocation of one asset type.
    #[must_use]
    pub fn allocation_by_type(&self, asset_type: AssetType) -> Decimal {
        self.holdings
            .iter()
            .filter(|h| h.record.asset_type == asset_type)
            .map(|h| h.allocation_pct)
            .sum()
    }

    /// Returns the combined allocation of equity holdings.
    #[must_use]
    pub fn equity_allocation(&self) -> Decimal {
        self.holdings
            .iter()
            .filter(|h| h.record.asset_type.is_equity())
            .map(|h| h.allocation_pct)
            .sum()
    }

    /// Returns the allocation weights keyed by ticker, in percent.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if an allocation is not representable
    /// as `f64`.
    pub fn weights(&self) -> XRayResult<Weights> {
        let pairs = self
            .holdings
            .iter()
            .map(|h| Ok((h.record.ticker.clone(), decimal_to_f64(h.allocation_pct)?)))
            .collect::<XRayResult<Vec<_>>>()?;
        Ok(Weights::from_percentages(pairs))
    }

    /// Returns the underlying records.
    #[must_use]
    pub fn records(&self) -> Vec<PortfolioRecord> {
        self.holdings.iter().map(|h| h.record.clone()).collect()
    }

    /// Rebuilds the portfolio with a new amount for one ticker.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if the ticker is not held or the new
    /// amount is not positive.
    pub fn with_amount(&self, ticker: &str, amount: Decimal) -> XRayResult<Self> {
        let mut records = self.records();
        let record = records
            .iter_mut()
            .find(|r| r.ticker.as_str() == ticker)
            .ok_or_else(|| XRayError::Validation(format!("{} is not in the portfolio", ticker)))?;
        record.amount = amount;
        build_portfolio(records)
    }
}

/// Normalizes raw records into a portfolio with allocation percentages.
///
/// # Errors
///
/// Returns `XRayError::Validation` if:
/// - `records` is empty
/// - Any amount is zero or negative
/// - Any ticker is blank
/// - The total amount overflows `Decimal`
pub fn build_portfolio(records: Vec<PortfolioRecord>) -> XRayResult<Portfolio> {
    if records.is_empty() {
        return Err(XRayError::Validation(
            "Portfolio records list is empty".to_string(),
        ));
    }

    for record in &records {
        if record.ticker.as_str().trim().is_empty() {
            return Err(XRayError::Validation(
                "Ticker must not be blank".to_string(),
            ));
        }
        if record.amount <= Decimal::ZERO {
            return Err(XRayError::Validation(format!(
                "Amount invested in {} must be positive, got {}",
                record.ticker, record.amount
            )));
        }
    }

    let total_amount = records
        .iter()
        .try_fold(Decimal::ZERO, |total, r| total.checked_add(r.amount))
        .ok_or_else(|| XRayError::Validation("Total amount invested overflows".to_string()))?;

    let holdings = records
        .into_iter()
        .map(|record| {
            let allocation_pct = record.amount / total_amount * HUNDRED;
            Holding {
                record,
                allocation_pct,
            }
        })
        .collect();

    Ok(Portfolio {
        holdings,
        total_amount,
    })
}
