//! Date-indexed tables and series.
//!
//! [`DateTable`] stores one `f64` column per ticker over a strictly increasing
//! date index. Missing observations are represented as `NaN` while a table is
//! being cleaned; tables handed out by the acquisition and returns stages
//! contain no missing values.
//!
//! [`DateSeries`] is the single-column counterpart used for the portfolio
//! return series.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::types::error::{XRayError, XRayResult};
use crate::types::ticker::Ticker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Date-indexed table with one numeric column per ticker.
///
/// # Invariants
///
/// - Dates are strictly increasing
/// - Every column has exactly one value per date
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::types::{DateTable, Ticker};
///
/// let dates = vec![
///     NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
/// ];
/// let table = DateTable::new(
///     dates,
///     vec![Ticker::new("SPY")],
///     vec![vec![470.0, 468.5]],
/// )
/// .unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.column("SPY"), Some(&[470.0, 468.5][..]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<Ticker>,
    /// Column-major storage, `columns[i]` belongs to `tickers[i]`.
    columns: Vec<Vec<f64>>,
}

/// Cleaned closing prices, one column per surviving ticker.
pub type PriceTable = DateTable;

/// Day-over-day fractional returns, one column per ticker.
pub type ReturnsTable = DateTable;

impl DateTable {
    /// Creates a new table after checking its shape.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if:
    /// - The number of columns differs from the number of tickers
    /// - Any column length differs from the number of dates
    /// - Dates are not strictly increasing
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<Ticker>,
        columns: Vec<Vec<f64>>,
    ) -> XRayResult<Self> {
        if tickers.len() != columns.len() {
            return Err(XRayError::Validation(format!(
                "{} tickers but {} columns",
                tickers.len(),
                columns.len()
            )));
        }

        for (ticker, column) in tickers.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(XRayError::Validation(format!(
                    "column {} has {} values for {} dates",
                    ticker,
                    column.len(),
                    dates.len()
                )));
            }
        }

        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(XRayError::Validation(
                "dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            dates,
            tickers,
            columns,
        })
    }

    /// Assembles a table whose shape the caller already guarantees.
    pub(crate) fn from_parts(
        dates: Vec<NaiveDate>,
        tickers: Vec<Ticker>,
        columns: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(tickers.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == dates.len()));
        Self {
            dates,
            tickers,
            columns,
        }
    }

    /// Creates a table with the given columns and no rows.
    #[must_use]
    pub fn empty(tickers: Vec<Ticker>) -> Self {
        let columns = vec![Vec::new(); tickers.len()];
        Self {
            dates: Vec::new(),
            tickers,
            columns,
        }
    }

    /// Returns the date index.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Returns the column tickers in table order.
    #[must_use]
    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Returns the number of dates (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns the number of ticker columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.tickers.len()
    }

    /// Returns true if the table has no rows or no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.tickers.is_empty()
    }

    /// Returns the column for a ticker.
    #[must_use]
    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.tickers
            .iter()
            .position(|t| t.as_str() == ticker)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Iterates over `(ticker, column)` pairs in table order.
    pub fn columns(&self) -> impl Iterator<Item = (&Ticker, &[f64])> {
        self.tickers
            .iter()
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Returns the values of one row in column order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dates.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[index]).collect())
    }

    /// Returns true if any cell is missing (`NaN`).
    #[must_use]
    pub fn has_missing(&self) -> bool {
        self.columns.iter().flatten().any(|v| v.is_nan())
    }

    /// Returns the first date on which the ticker has a value.
    #[must_use]
    pub fn first_valid_date(&self, ticker: &str) -> Option<NaiveDate> {
        let column = self.column(ticker)?;
        column
            .iter()
            .position(|v| !v.is_nan())
            .map(|idx| self.dates[idx])
    }

    /// Returns the first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.dates.len());
        self.select_rows(&(0..n).collect::<Vec<_>>())
    }

    /// Returns the rows whose date is in `dates`, preserving order.
    #[must_use]
    pub fn restrict_to(&self, dates: &BTreeSet<NaiveDate>) -> Self {
        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| dates.contains(d))
            .map(|(idx, _)| idx)
            .collect();
        self.select_rows(&rows)
    }

    /// Carries the last valid value forward over gaps between two valid
    /// cells.
    ///
    /// With `limit = Some(k)` at most `k` consecutive missing cells are
    /// filled per gap. Leading and trailing missing cells stay missing: a
    /// series that has not started or has already ended is not extended.
    pub fn forward_fill(&mut self, limit: Option<usize>) {
        for column in &mut self.columns {
            let mut last: Option<(usize, f64)> = None;
            for idx in 0..column.len() {
                let value = column[idx];
                if value.is_nan() {
                    continue;
                }
                if let Some((prev_idx, prev)) = last {
                    let gap = idx - prev_idx - 1;
                    let fill = limit.map_or(gap, |k| gap.min(k));
                    column[prev_idx + 1..prev_idx + 1 + fill].fill(prev);
                }
                last = Some((idx, value));
            }
        }
    }

    /// Returns a copy without any row that has a missing cell.
    #[must_use]
    pub fn drop_incomplete_rows(&self) -> Self {
        let rows: Vec<usize> = (0..self.dates.len())
            .filter(|&idx| self.columns.iter().all(|c| !c[idx].is_nan()))
            .collect();
        self.select_rows(&rows)
    }

    fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&idx| self.dates[idx]).collect(),
            tickers: self.tickers.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| rows.iter().map(|&idx| c[idx]).collect())
                .collect(),
        }
    }
}

/// Date-indexed single series.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::types::DateSeries;
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let series = DateSeries::new(vec![d], vec![0.004]).unwrap();
/// assert_eq!(series.get(d), Some(0.004));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// Weighted portfolio return per date.
pub type ReturnSeries = DateSeries;

impl DateSeries {
    /// Creates a new series.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::Validation` if lengths differ or dates are not
    /// strictly increasing.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> XRayResult<Self> {
        if dates.len() != values.len() {
            return Err(XRayError::Validation(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(XRayError::Validation(
                "dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { dates, values })
    }

    pub(crate) fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    /// Returns the date index.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Returns the values in date order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value on a date.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterates over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}
