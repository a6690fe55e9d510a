//! Auto-healing price acquisition.
//!
//! # Algorithm
//!
//! The acquirer looks for a common, gap-free price history for as many of the
//! requested tickers as possible:
//!
//! 1. Fetch prices for the working ticker set
//! 2. Drop every ticker without a usable close field or numeric value, and
//!    refetch if any were dropped
//! 3. Forward-fill gaps, then keep only the dates on which every remaining
//!    ticker has a price
//! 4. If no date survives, drop the ticker whose history starts last and
//!    refetch
//!
//! The loop is modelled as an explicit state machine:
//!
//! ```text
//! Fetching ──receive──▶ Evaluating ──evaluate──▶ Healed
//!    ▲                      │
//!    └──── tickers dropped ─┤
//!                           └─────────────────▶ Exhausted
//! ```
//!
//! Every evaluation either heals, exhausts, or removes at least one ticker,
//! and the number of evaluations is capped at the initial ticker count, so
//! the loop always terminates.
//!
//! A provider failure is not a data-quality problem: it aborts acquisition
//! immediately and never removes a ticker.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::data::provider::{DateRange, PriceProvider, PriceResponse};
use crate::types::error::{XRayError, XRayResult};
use crate::types::table::{DateTable, PriceTable};
use crate::types::ticker::Ticker;

#[cfg(feature = "data-feeds")]
use crate::data::provider::AsyncPriceProvider;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default cap on consecutive missing dates forward-filled per gap.
pub const DEFAULT_FILL_LIMIT: usize = 5;

/// State of the auto-heal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealState {
    /// Waiting for prices of the working set.
    Fetching,
    /// A response has been received and awaits evaluation.
    Evaluating,
    /// A common history was found.
    Healed,
    /// No ticker subset has a common history.
    Exhausted,
}

impl fmt::Display for HealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealState::Fetching => "fetching",
            HealState::Evaluating => "evaluating",
            HealState::Healed => "healed",
            HealState::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

/// Why a ticker was excluded from the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DropReason {
    /// The provider returned neither an adjusted nor an unadjusted close.
    MissingPriceField,
    /// The ticker had no rows in range, or every closing value was missing.
    NoNumericData,
    /// Its history starts last and prevented any common date window.
    LateHistory {
        /// First date on which the ticker had a price.
        first_valid: NaiveDate,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingPriceField => write!(f, "no close price field"),
            DropReason::NoNumericData => write!(f, "no numeric price data"),
            DropReason::LateHistory { first_valid } => {
                write!(f, "history starts {} and blocks a common window", first_valid)
            }
        }
    }
}

/// A ticker excluded during acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DroppedTicker {
    /// The excluded ticker.
    pub ticker: Ticker,
    /// Why it was excluded.
    pub reason: DropReason,
    /// Evaluation round (1-based) in which it was excluded.
    pub iteration: usize,
}

/// Successful acquisition result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AcquiredPrices {
    /// Gap-free prices of the surviving tickers.
    pub prices: PriceTable,
    /// Tickers excluded along the way, in drop order.
    pub dropped: Vec<DroppedTicker>,
}

impl AcquiredPrices {
    /// Returns the surviving tickers in request order.
    #[must_use]
    pub fn surviving(&self) -> &[Ticker] {
        self.prices.tickers()
    }

    /// Returns the dropped tickers in drop order.
    #[must_use]
    pub fn dropped_tickers(&self) -> Vec<&Ticker> {
        self.dropped.iter().map(|d| &d.ticker).collect()
    }
}

/// Bounded auto-heal state machine.
///
/// The machine holds no I/O: a driver reads [`working`](Self::working) while
/// the state is [`HealState::Fetching`], hands the provider response to
/// [`receive`](Self::receive), calls [`evaluate`](Self::evaluate), and
/// repeats until the state is terminal.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::data::{AutoHealMachine, HealState, PriceResponse, QuoteRow};
/// use portfolio_xray::types::Ticker;
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let mut machine = AutoHealMachine::new(&[Ticker::new("SPY")], None);
/// assert_eq!(machine.state(), HealState::Fetching);
///
/// machine.receive(PriceResponse::single("SPY", vec![QuoteRow::adjusted(d, 470.0)]));
/// assert_eq!(machine.evaluate(), HealState::Healed);
///
/// let acquired = machine.finish().unwrap();
/// assert_eq!(acquired.prices.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct AutoHealMachine {
    state: HealState,
    working: Vec<Ticker>,
    dropped: Vec<DroppedTicker>,
    pending: Option<PriceResponse>,
    healed: Option<PriceTable>,
    failure: Option<XRayError>,
    iterations: usize,
    budget: usize,
    fill_limit: Option<usize>,
}

impl AutoHealMachine {
    /// Creates a machine for the given tickers.
    ///
    /// `fill_limit` caps how many consecutive missing dates are
    /// forward-filled per gap; `None` fills every gap between two prices.
    #[must_use]
    pub fn new(tickers: &[Ticker], fill_limit: Option<usize>) -> Self {
        let mut machine = Self {
            state: HealState::Fetching,
            working: tickers.to_vec(),
            dropped: Vec::new(),
            pending: None,
            healed: None,
            failure: None,
            iterations: 0,
            budget: tickers.len(),
            fill_limit,
        };
        if machine.working.is_empty() {
            machine.exhaust("all assets dropped, no tickers to fetch");
        }
        machine
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> HealState {
        self.state
    }

    /// Returns the tickers still in play, in request order.
    #[must_use]
    pub fn working(&self) -> &[Ticker] {
        &self.working
    }

    /// Returns the tickers dropped so far.
    #[must_use]
    pub fn dropped(&self) -> &[DroppedTicker] {
        &self.dropped
    }

    /// Returns the number of evaluations performed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the maximum number of evaluations.
    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Accepts the provider response for the working set.
    ///
    /// Has no effect unless the machine is [`HealState::Fetching`].
    pub fn receive(&mut self, response: PriceResponse) -> HealState {
        if self.state == HealState::Fetching {
            self.pending = Some(response);
            self.state = HealState::Evaluating;
        }
        self.state
    }

    /// Evaluates the pending response and moves to the next state.
    ///
    /// Has no effect unless the machine is [`HealState::Evaluating`].
    pub fn evaluate(&mut self) -> HealState {
        if self.state != HealState::Evaluating {
            return self.state;
        }
        let response = self.pending.take().unwrap_or_default();

        if self.iterations >= self.budget {
            self.exhaust("no common date range for any subset of tickers");
            return self.state;
        }
        self.iterations += 1;
        debug!(
            iteration = self.iterations,
            budget = self.budget,
            tickers = self.working.len(),
            "evaluating price response"
        );

        let table = match self.extract_closes(&response) {
            Some(table) => table,
            None => return self.after_drop(),
        };

        let mut filled = table.clone();
        filled.forward_fill(self.fill_limit);
        let common = filled.drop_incomplete_rows();

        if !common.is_empty() {
            info!(
                tickers = common.width(),
                dates = common.len(),
                dropped = self.dropped.len(),
                "common price history found"
            );
            self.healed = Some(common);
            self.state = HealState::Healed;
            return self.state;
        }

        if let Some((ticker, first_valid)) = Self::latest_starter(&table) {
            self.drop_ticker(ticker, DropReason::LateHistory { first_valid });
        }
        self.after_drop()
    }

    /// Consumes the machine and returns the outcome.
    ///
    /// # Errors
    ///
    /// Returns `XRayError::InsufficientData` if the machine is exhausted or
    /// has not reached a terminal state.
    pub fn finish(self) -> XRayResult<AcquiredPrices> {
        match (self.state, self.healed, self.failure) {
            (HealState::Healed, Some(prices), _) => Ok(AcquiredPrices {
                prices,
                dropped: self.dropped,
            }),
            (HealState::Exhausted, _, Some(failure)) => Err(failure),
            (state, _, _) => Err(XRayError::InsufficientData(format!(
                "price acquisition stopped while {}",
                state
            ))),
        }
    }

    /// Builds the raw close table, dropping unusable tickers.
    ///
    /// Returns `None` when at least one ticker was dropped.
    fn extract_closes(&mut self, response: &PriceResponse) -> Option<PriceTable> {
        let mut removals = Vec::new();
        let mut series = Vec::with_capacity(self.working.len());

        for ticker in &self.working {
            if response.rows(ticker.as_str()).is_some_and(<[_]>::is_empty) {
                removals.push((ticker.clone(), DropReason::NoNumericData));
                continue;
            }
            match response.closing_series(ticker.as_str()) {
                None => removals.push((ticker.clone(), DropReason::MissingPriceField)),
                Some((_, closes)) if closes.values().all(|v| v.is_nan()) => {
                    removals.push((ticker.clone(), DropReason::NoNumericData));
                }
                Some((_, closes)) => series.push(closes),
            }
        }

        if !removals.is_empty() {
            for (ticker, reason) in removals {
                self.drop_ticker(ticker, reason);
            }
            return None;
        }

        let dates: BTreeSet<NaiveDate> = series.iter().flat_map(|s| s.keys().copied()).collect();
        let columns = series
            .iter()
            .map(|s| {
                dates
                    .iter()
                    .map(|d| s.get(d).copied().unwrap_or(f64::NAN))
                    .collect()
            })
            .collect();

        Some(DateTable::from_parts(
            dates.into_iter().collect(),
            self.working.clone(),
            columns,
        ))
    }

    /// Finds the ticker whose first valid date is latest.
    ///
    /// Ties go to the ticker that comes first in request order.
    fn latest_starter(table: &PriceTable) -> Option<(Ticker, NaiveDate)> {
        let mut latest: Option<(Ticker, NaiveDate)> = None;
        for ticker in table.tickers() {
            if let Some(first) = table.first_valid_date(ticker.as_str()) {
                let later = latest.as_ref().is_none_or(|(_, best)| first > *best);
                if later {
                    latest = Some((ticker.clone(), first));
                }
            }
        }
        latest
    }

    fn drop_ticker(&mut self, ticker: Ticker, reason: DropReason) {
        warn!(ticker = %ticker, reason = %reason, iteration = self.iterations, "dropping ticker");
        self.working.retain(|t| *t != ticker);
        self.dropped.push(DroppedTicker {
            ticker,
            reason,
            iteration: self.iterations,
        });
    }

    fn after_drop(&mut self) -> HealState {
        if self.working.is_empty() {
            self.exhaust("all assets dropped, no ticker has usable price history");
        } else {
            self.state = HealState::Fetching;
        }
        self.state
    }

    fn exhaust(&mut self, message: &str) {
        warn!(dropped = self.dropped.len(), "price acquisition exhausted: {}", message);
        self.failure = Some(XRayError::InsufficientData(message.to_string()));
        self.state = HealState::Exhausted;
    }
}

/// Fetches a common price history, auto-healing by dropping tickers.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use portfolio_xray::data::{DateRange, InMemoryPriceProvider, PriceAcquirer};
/// use portfolio_xray::types::Ticker;
///
/// let days: Vec<NaiveDate> = (2..6)
///     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
///     .collect();
///
/// let provider = InMemoryPriceProvider::new()
///     .with_closes("SPY", &days, &[470.0, 468.0, 472.0, 475.0])
///     .with_closes("NEW", &days[3..], &[10.0]);
///
/// let acquirer = PriceAcquirer::new(DateRange::since(days[0]));
/// let acquired = acquirer
///     .acquire(&provider, &[Ticker::new("SPY"), Ticker::new("NEW")])
///     .unwrap();
///
/// assert_eq!(acquired.surviving(), &[Ticker::new("SPY"), Ticker::new("NEW")]);
/// assert_eq!(acquired.prices.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAcquirer {
    range: DateRange,
    fill_limit: Option<usize>,
}

impl Default for PriceAcquirer {
    fn default() -> Self {
        Self::new(DateRange::default())
    }
}

impl PriceAcquirer {
    /// Creates an acquirer for the given date range that fills gaps of up
    /// to [`DEFAULT_FILL_LIMIT`] dates.
    #[must_use]
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            fill_limit: Some(DEFAULT_FILL_LIMIT),
        }
    }

    /// Caps forward-fill to `limit` consecutive missing dates per gap,
    /// `None` for no cap.
    #[must_use]
    pub fn with_fill_limit(mut self, limit: Option<usize>) -> Self {
        self.fill_limit = limit;
        self
    }

    /// Returns the requested date range.
    #[must_use]
    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Acquires prices from a synchronous provider.
    ///
    /// # Errors
    ///
    /// - `XRayError::DataSource` if the provider fails
    /// - `XRayError::InsufficientData` if every ticker is dropped or no
    ///   subset has a common history
    pub fn acquire<P>(&self, provider: &P, tickers: &[Ticker]) -> XRayResult<AcquiredPrices>
    where
        P: PriceProvider + ?Sized,
    {
        let mut machine = AutoHealMachine::new(tickers, self.fill_limit);
        loop {
            match machine.state() {
                HealState::Fetching => {
                    let response = PriceProvider::fetch(provider, machine.working(), &self.range)
                        .map_err(as_data_source)?;
                    machine.receive(response);
                }
                HealState::Evaluating => {
                    machine.evaluate();
                }
                HealState::Healed | HealState::Exhausted => return machine.finish(),
            }
        }
    }

    /// Acquires prices from an asynchronous provider.
    ///
    /// # Errors
    ///
    /// Same as [`acquire`](Self::acquire).
    #[cfg(feature = "data-feeds")]
    pub async fn acquire_async<P>(
        &self,
        provider: &P,
        tickers: &[Ticker],
    ) -> XRayResult<AcquiredPrices>
    where
        P: AsyncPriceProvider + ?Sized,
    {
        let mut machine = AutoHealMachine::new(tickers, self.fill_limit);
        loop {
            match machine.state() {
                HealState::Fetching => {
                    let response = AsyncPriceProvider::fetch(provider, machine.working(), &self.range)
                        .await
                        .map_err(as_data_source)?;
                    machine.receive(response);
                }
                HealState::Evaluating => {
                    machine.evaluate();
                }
                HealState::Healed | HealState::Exhausted => return machine.finish(),
            }
        }
    }
}

fn as_data_source(error: XRayError) -> XRayError {
    match error {
        XRayError::DataSource(_) => error,
        other => XRayError::DataSource(other.to_string()),
    }
}
