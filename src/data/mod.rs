//! Market data acquisition.
//!
//! This module turns an external price source into a clean, common price
//! history for the portfolio's tickers.
//!
//! # Overview
//!
//! - **Provider seam**: [`PriceProvider`] (and [`AsyncPriceProvider`] with the
//!   `data-feeds` feature) abstracts the market data source
//! - **Normalized responses**: [`PriceResponse`] gives one per-ticker row
//!   lookup regardless of the provider's response shape
//! - **Auto-healing**: [`PriceAcquirer`] drives the bounded
//!   [`AutoHealMachine`], dropping tickers with unusable or non-overlapping
//!   history
//! - **In-memory provider**: [`InMemoryPriceProvider`] for tests and replay
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_xray::data::{DateRange, InMemoryPriceProvider, PriceAcquirer};
//! use portfolio_xray::types::Ticker;
//!
//! let days: Vec<NaiveDate> = (1..=5)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap())
//!     .collect();
//!
//! let provider = InMemoryPriceProvider::new()
//!     .with_closes("SPY", &days, &[500.0, 502.0, 499.0, 505.0, 507.0])
//!     .with_closes("GLD", &days, &[200.0, 201.0, 203.0, 202.0, 204.0]);
//!
//! let acquired = PriceAcquirer::new(DateRange::since(days[0]))
//!     .acquire(&provider, &[Ticker::new("SPY"), Ticker::new("GLD"), Ticker::new("DELISTED")])
//!     .unwrap();
//!
//! assert_eq!(acquired.prices.width(), 2);
//! assert_eq!(acquired.dropped_tickers(), vec![&Ticker::new("DELISTED")]);
//! ```

mod acquirer;
mod memory;
mod provider;

pub use acquirer::{
    AcquiredPrices, AutoHealMachine, DEFAULT_FILL_LIMIT, DropReason, DroppedTicker, HealState,
    PriceAcquirer,
};
pub use memory::InMemoryPriceProvider;
#[cfg(feature = "data-feeds")]
pub use provider::AsyncPriceProvider;
pub use provider::{DateRange, PriceField, PriceProvider, PriceResponse, QuoteRow};
