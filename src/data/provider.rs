//! Market data provider seam and normalized responses.
//!
//! Providers differ in how they shape a response: a single-ticker request may
//! come back as a flat table, a multi-ticker request as one table per ticker,
//! and some sources only return long `(ticker, date, price)` rows.
//! [`PriceResponse`] absorbs all of these into one per-ticker lookup so the
//! acquisition algorithm never branches on how many tickers were requested.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::types::error::{XRayError, XRayResult};
use crate::types::ticker::Ticker;

#[cfg(feature = "data-feeds")]
use async_trait::async_trait;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inclusive date window requested from a provider.
///
/// An open `end` means "up to the latest available date".
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::data::DateRange;
///
/// let range = DateRange::default();
/// assert_eq!(range.start, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
/// assert!(range.end.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DateRange {
    /// First date requested.
    pub start: NaiveDate,
    /// Last date requested, if bounded.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a new range.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::InvalidConfiguration` if `end` precedes `start`.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> XRayResult<Self> {
        match end {
            Some(end) if end < start => Err(XRayError::InvalidConfiguration(format!(
                "Date range end {} precedes start {}",
                end, start
            ))),
            _ => Ok(Self { start, end }),
        }
    }

    /// Creates an open-ended range starting at `start`.
    #[must_use]
    pub fn since(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// Returns true if the date falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::since(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default())
    }
}

/// Closing prices reported for one ticker on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuoteRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Split/dividend adjusted close, when the source provides it.
    pub adj_close: Option<f64>,
    /// Unadjusted close.
    pub close: Option<f64>,
}

impl QuoteRow {
    /// Creates a row with both fields.
    #[must_use]
    pub fn new(date: NaiveDate, adj_close: Option<f64>, close: Option<f64>) -> Self {
        Self {
            date,
            adj_close,
            close,
        }
    }

    /// Creates a row carrying only an adjusted close.
    #[must_use]
    pub fn adjusted(date: NaiveDate, adj_close: f64) -> Self {
        Self::new(date, Some(adj_close), None)
    }

    /// Creates a row carrying only an unadjusted close.
    #[must_use]
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self::new(date, None, Some(close))
    }
}

/// Which close field a ticker's series was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PriceField {
    /// Adjusted close.
    AdjClose,
    /// Unadjusted close.
    Close,
}

/// Provider response normalized to one row list per ticker.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceResponse {
    series: HashMap<Ticker, Vec<QuoteRow>>,
}

impl PriceResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a single-ticker (flat) response.
    #[must_use]
    pub fn single(ticker: impl Into<Ticker>, rows: Vec<QuoteRow>) -> Self {
        Self::new().with_series(ticker, rows)
    }

    /// Normalizes long-format `(ticker, row)` pairs.
    #[must_use]
    pub fn from_long_rows(rows: impl IntoIterator<Item = (Ticker, QuoteRow)>) -> Self {
        let mut response = Self::new();
        for (ticker, row) in rows {
            response.series.entry(ticker).or_default().push(row);
        }
        response
    }

    /// Adds the rows of one ticker (multi-ticker responses).
    #[must_use]
    pub fn with_series(mut self, ticker: impl Into<Ticker>, rows: Vec<QuoteRow>) -> Self {
        self.insert(ticker, rows);
        self
    }

    /// Adds or replaces the rows of one ticker.
    pub fn insert(&mut self, ticker: impl Into<Ticker>, rows: Vec<QuoteRow>) {
        self.series.insert(ticker.into(), rows);
    }

    /// Returns the raw rows of a ticker.
    #[must_use]
    pub fn rows(&self, ticker: &str) -> Option<&[QuoteRow]> {
        self.series.get(ticker).map(Vec::as_slice)
    }

    /// Returns true if no ticker has rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.values().all(Vec::is_empty)
    }

    /// Extracts a ticker's closing series.
    ///
    /// The adjusted close is used when any row carries one, otherwise the
    /// unadjusted close. Missing or non-finite cells become `NaN`. Returns
    /// `None` when the ticker is absent or has neither field.
    #[must_use]
    pub fn closing_series(&self, ticker: &str) -> Option<(PriceField, BTreeMap<NaiveDate, f64>)> {
        let rows = self.series.get(ticker)?;

        let field = if rows.iter().any(|r| r.adj_close.is_some()) {
            PriceField::AdjClose
        } else if rows.iter().any(|r| r.close.is_some()) {
            PriceField::Close
        } else {
            return None;
        };

        let series = rows
            .iter()
            .map(|row| {
                let value = match field {
                    PriceField::AdjClose => row.adj_close,
                    PriceField::Close => row.close,
                };
                let value = value.filter(|v| v.is_finite()).unwrap_or(f64::NAN);
                (row.date, value)
            })
            .collect();

        Some((field, series))
    }
}

/// Synchronous market data capability.
///
/// Implementations fetch daily closes for the requested tickers within the
/// range. A transport or provider failure must be reported as
/// `XRayError::DataSource`; it aborts the run and never causes tickers to be
/// dropped. Tickers the provider knows nothing about are simply absent from
/// the response.
pub trait PriceProvider {
    /// Fetches prices for `tickers` within `range`.
    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> XRayResult<PriceResponse>;
}

/// Asynchronous market data capability for I/O-bound sources.
#[cfg(feature = "data-feeds")]
#[async_trait]
pub trait AsyncPriceProvider: Send + Sync {
    /// Fetches prices for `tickers` within `range`.
    async fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> XRayResult<PriceResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::new(day(5), Some(day(1))).is_err());
        assert!(DateRange::new(day(1), Some(day(1))).is_ok());
        assert!(DateRange::new(day(1), None).is_ok());
    }

    #[test]
    fn test_date_range_contains() {
        let bounded = DateRange::new(day(2), Some(day(4))).unwrap();
        assert!(!bounded.contains(day(1)));
        assert!(bounded.contains(day(2)));
        assert!(bounded.contains(day(4)));
        assert!(!bounded.contains(day(5)));
        assert!(DateRange::since(day(2)).contains(day(30)));
    }

    #[test]
    fn test_prefers_adjusted_close() {
        let response = PriceResponse::single(
            "SPY",
            vec![
                QuoteRow::new(day(1), Some(99.0), Some(100.0)),
                QuoteRow::new(day(2), None, Some(101.0)),
            ],
        );
        let (field, series) = response.closing_series("SPY").unwrap();

        assert_eq!(field, PriceField::AdjClose);
        assert_eq!(series[&day(1)], 99.0);
        assert!(series[&day(2)].is_nan());
    }

    #[test]
    fn test_falls_back_to_close() {
        let response = PriceResponse::single("GLD", vec![QuoteRow::close_only(day(1), 180.0)]);
        let (field, series) = response.closing_series("GLD").unwrap();

        assert_eq!(field, PriceField::Close);
        assert_eq!(series[&day(1)], 180.0);
    }

    #[test]
    fn test_missing_both_fields() {
        let response = PriceResponse::single("XYZ", vec![QuoteRow::new(day(1), None, None)]);
        assert!(response.closing_series("XYZ").is_none());
        assert!(response.closing_series("ABC").is_none());
    }

    #[test]
    fn test_non_finite_becomes_missing() {
        let response =
            PriceResponse::single("BAD", vec![QuoteRow::adjusted(day(1), f64::INFINITY)]);
        let (_, series) = response.closing_series("BAD").unwrap();
        assert!(series[&day(1)].is_nan());
    }

    #[test]
    fn test_shapes_normalize_identically() {
        let rows_a = vec![QuoteRow::adjusted(day(1), 1.0), QuoteRow::adjusted(day(2), 2.0)];
        let rows_b = vec![QuoteRow::adjusted(day(1), 3.0)];

        let multi = PriceResponse::new()
            .with_series("A", rows_a.clone())
            .with_series("B", rows_b.clone());

        let long = PriceResponse::from_long_rows(
            rows_a
                .into_iter()
                .map(|r| (Ticker::new("A"), r))
                .chain(rows_b.into_iter().map(|r| (Ticker::new("B"), r))),
        );

        assert_eq!(multi, long);
        assert!(!multi.is_empty());
        assert!(PriceResponse::new().is_empty());
    }
}
