//! In-memory price provider.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::data::provider::{DateRange, PriceProvider, PriceResponse, QuoteRow};
use crate::types::error::{XRayError, XRayResult};
use crate::types::ticker::Ticker;

#[cfg(feature = "data-feeds")]
use crate::data::provider::AsyncPriceProvider;
#[cfg(feature = "data-feeds")]
use async_trait::async_trait;

type SeriesMap = HashMap<Ticker, Vec<QuoteRow>>;

/// In-memory price provider for tests, demos and replaying stored data.
///
/// Answers every request from a fixed set of rows, so repeated runs see an
/// identical response. Every request is logged for inspection.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::data::{DateRange, InMemoryPriceProvider, PriceProvider};
/// use portfolio_xray::types::Ticker;
///
/// let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
/// let provider = InMemoryPriceProvider::new().with_closes("SPY", &[d1, d2], &[470.0, 468.0]);
///
/// let response = provider
///     .fetch(&[Ticker::new("SPY")], &DateRange::since(d1))
///     .unwrap();
/// assert_eq!(response.rows("SPY").unwrap().len(), 2);
/// assert_eq!(provider.request_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryPriceProvider {
    series: SeriesMap,
    failure: Option<String>,
    requests: Mutex<Vec<Vec<Ticker>>>,
}

impl InMemoryPriceProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds raw rows for a ticker.
    #[must_use]
    pub fn with_series(mut self, ticker: impl Into<Ticker>, rows: Vec<QuoteRow>) -> Self {
        self.series.insert(ticker.into(), rows);
        self
    }

    /// Adds adjusted closes for a ticker. `NaN` marks a missing cell.
    ///
    /// Extra dates or prices beyond the shorter slice are ignored.
    #[must_use]
    pub fn with_closes(self, ticker: impl Into<Ticker>, dates: &[NaiveDate], prices: &[f64]) -> Self {
        let rows = dates
            .iter()
            .zip(prices)
            .map(|(&date, &price)| QuoteRow::new(date, Some(price), Some(price)))
            .collect();
        self.with_series(ticker, rows)
    }

    /// Makes every fetch fail with `XRayError::DataSource`.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the number of fetches served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map_or(0, |log| log.len())
    }

    /// Returns the ticker sets requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<Ticker>> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn respond(&self, tickers: &[Ticker], range: &DateRange) -> XRayResult<PriceResponse> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(tickers.to_vec());
        }

        if let Some(message) = &self.failure {
            return Err(XRayError::DataSource(message.clone()));
        }

        let mut response = PriceResponse::new();
        for ticker in tickers {
            if let Some(rows) = self.series.get(ticker) {
                let rows: Vec<QuoteRow> = rows
                    .iter()
                    .filter(|r| range.contains(r.date))
                    .copied()
                    .collect();
                response.insert(ticker.clone(), rows);
            }
        }
        Ok(response)
    }
}

impl PriceProvider for InMemoryPriceProvider {
    fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> XRayResult<PriceResponse> {
        self.respond(tickers, range)
    }
}

#[cfg(feature = "data-feeds")]
#[async_trait]
impl AsyncPriceProvider for InMemoryPriceProvider {
    async fn fetch(&self, tickers: &[Ticker], range: &DateRange) -> XRayResult<PriceResponse> {
        self.respond(tickers, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn provider() -> InMemoryPriceProvider {
        InMemoryPriceProvider::new()
            .with_closes("A", &[day(1), day(2), day(3)], &[10.0, 11.0, 12.0])
            .with_closes("B", &[day(2), day(3)], &[5.0, 6.0])
    }

    #[test]
    fn test_fetch_filters_requested_tickers() {
        let provider = provider();
        let response = PriceProvider::fetch(
            &provider,
            &[Ticker::new("B"), Ticker::new("Z")],
            &DateRange::since(day(1)),
        )
        .unwrap();

        assert!(response.rows("A").is_none());
        assert_eq!(response.rows("B").unwrap().len(), 2);
        assert!(response.rows("Z").is_none());
    }

    #[test]
    fn test_fetch_filters_range() {
        let provider = provider();
        let range = DateRange::new(day(2), Some(day(2))).unwrap();
        let response = PriceProvider::fetch(&provider, &[Ticker::new("A")], &range).unwrap();

        let rows = response.rows("A").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, day(2));
    }

    #[test]
    fn test_known_ticker_outside_range_has_empty_rows() {
        let provider = provider();
        let range = DateRange::since(day(10));
        let response = PriceProvider::fetch(&provider, &[Ticker::new("A")], &range).unwrap();

        assert_eq!(response.rows("A"), Some(&[][..]));
    }

    #[test]
    fn test_failure_is_data_source_error() {
        let provider = provider().with_failure("connection reset");
        let result = PriceProvider::fetch(&provider, &[Ticker::new("A")], &DateRange::default());
        assert_eq!(
            result,
            Err(XRayError::DataSource("connection reset".to_string()))
        );
    }

    #[test]
    fn test_requests_are_logged() {
        let provider = provider();
        let range = DateRange::since(day(1));
        PriceProvider::fetch(&provider, &[Ticker::new("A"), Ticker::new("B")], &range).unwrap();
        PriceProvider::fetch(&provider, &[Ticker::new("A")], &range).unwrap();

        assert_eq!(provider.request_count(), 2);
        assert_eq!(provider.requests()[1], vec![Ticker::new("A")]);
    }

    #[cfg(feature = "data-feeds")]
    #[tokio::test]
    async fn test_async_fetch_matches_sync() {
        let provider = provider();
        let range = DateRange::since(day(1));
        let tickers = [Ticker::new("A")];

        let sync = PriceProvider::fetch(&provider, &tickers, &range).unwrap();
        let from_async = AsyncPriceProvider::fetch(&provider, &tickers, &range)
            .await
            .unwrap();
        assert_eq!(sync, from_async);
    }
}
