//! Asset and portfolio returns.
//!
//! # Formulas
//!
//! Asset return for ticker `a` on date `t`:
//! ```text
//! r[t, a] = p[t, a] / p[t-1, a] - 1
//! ```
//!
//! Portfolio return on date `t`, with weights in percent:
//! ```text
//! R[t] = Σ r[t, a] × w[a] / 100
//! ```

use crate::portfolio::Weights;
use crate::types::error::{XRayError, XRayResult};
use crate::types::table::{DateSeries, PriceTable, ReturnSeries, ReturnsTable};

/// Computes day-over-day fractional returns for every column.
///
/// The first row has no predecessor and is dropped, as is any row where a
/// return is missing or non-finite (a zero or missing previous price).
///
/// # Errors
///
/// Returns `XRayError::EmptyData` if the price table or the resulting returns
/// table is empty.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::risk::compute_asset_returns;
/// use portfolio_xray::types::{PriceTable, Ticker};
///
/// let dates = (1..=3)
///     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
///     .collect();
/// let prices = PriceTable::new(dates, vec![Ticker::new("A")], vec![vec![100.0, 102.0, 101.0]]).unwrap();
///
/// let returns = compute_asset_returns(&prices).unwrap();
/// assert_eq!(returns.len(), 2);
/// ```
pub fn compute_asset_returns(prices: &PriceTable) -> XRayResult<ReturnsTable> {
    if prices.is_empty() {
        return Err(XRayError::EmptyData("returns: price table is empty".to_string()));
    }

    let dates = prices.dates();
    let mut keep = Vec::with_capacity(dates.len().saturating_sub(1));
    let changes: Vec<Vec<f64>> = prices
        .columns()
        .map(|(_, column)| {
            column
                .windows(2)
                .map(|w| w[1] / w[0] - 1.0)
                .collect::<Vec<f64>>()
        })
        .collect();

    for row in 0..dates.len().saturating_sub(1) {
        if changes.iter().all(|c| c[row].is_finite()) {
            keep.push(row);
        }
    }

    if keep.is_empty() {
        return Err(XRayError::EmptyData(
            "returns: no complete return rows".to_string(),
        ));
    }

    let return_dates = keep.iter().map(|&row| dates[row + 1]).collect();
    let columns = changes
        .iter()
        .map(|c| keep.iter().map(|&row| c[row]).collect())
        .collect();

    Ok(ReturnsTable::from_parts(
        return_dates,
        prices.tickers().to_vec(),
        columns,
    ))
}

/// Computes the weighted portfolio return series.
///
/// Weights are re-aligned to the table's columns: a column without a weight
/// contributes zero and weights of tickers absent from the table are ignored.
#[must_use]
pub fn compute_portfolio_returns(returns: &ReturnsTable, weights: &Weights) -> ReturnSeries {
    let fractions = weights.aligned_fractions(returns.tickers());
    let mut values = vec![0.0; returns.len()];

    for ((_, column), weight) in returns.columns().zip(&fractions) {
        for (total, r) in values.iter_mut().zip(column) {
            *total += r * weight;
        }
    }

    DateSeries::from_parts(returns.dates().to_vec(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ticker::Ticker;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn prices() -> PriceTable {
        PriceTable::new(
            vec![day(3), day(4), day(5)],
            vec![Ticker::new("A"), Ticker::new("B")],
            vec![vec![100.0, 102.0, 101.0], vec![50.0, 49.0, 52.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_asset_returns_known_values() {
        let returns = compute_asset_returns(&prices()).unwrap();

        assert_eq!(returns.dates(), &[day(4), day(5)]);
        let a = returns.column("A").unwrap();
        let b = returns.column("B").unwrap();
        assert_relative_eq!(a[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(a[1], -0.0098, epsilon = 1e-4);
        assert_relative_eq!(b[0], -0.02, epsilon = 1e-12);
        assert_relative_eq!(b[1], 0.0612, epsilon = 1e-4);
    }

    #[test]
    fn test_portfolio_returns_weighted_sum() {
        let returns = compute_asset_returns(&prices()).unwrap();
        let weights =
            Weights::from_percentages([(Ticker::new("A"), 60.0), (Ticker::new("B"), 40.0)]);

        let portfolio = compute_portfolio_returns(&returns, &weights);
        assert_eq!(portfolio.len(), 2);
        assert_relative_eq!(portfolio.get(day(4)).unwrap(), 0.004, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_returns_realigns_weights() {
        let returns = compute_asset_returns(&prices()).unwrap();
        // B has no weight, C has no data
        let weights =
            Weights::from_percentages([(Ticker::new("A"), 50.0), (Ticker::new("C"), 50.0)]);

        let portfolio = compute_portfolio_returns(&returns, &weights);
        assert_relative_eq!(portfolio.values()[0], 0.01, epsilon = 1e-12);
        assert!(portfolio.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_single_row_is_empty_data() {
        let prices = prices().head(1);
        let result = compute_asset_returns(&prices);
        assert!(matches!(result, Err(XRayError::EmptyData(_))));
    }

    #[test]
    fn test_empty_prices_is_empty_data() {
        let prices = PriceTable::empty(vec![Ticker::new("A")]);
        assert!(matches!(
            compute_asset_returns(&prices),
            Err(XRayError::EmptyData(_))
        ));
    }

    #[test]
    fn test_zero_price_row_is_dropped() {
        let prices = PriceTable::new(
            vec![day(3), day(4), day(5)],
            vec![Ticker::new("A")],
            vec![vec![0.0, 1.0, 2.0]],
        )
        .unwrap();
        let returns = compute_asset_returns(&prices).unwrap();

        assert_eq!(returns.dates(), &[day(5)]);
        assert_relative_eq!(returns.column("A").unwrap()[0], 1.0, epsilon = 1e-12);
    }
}
