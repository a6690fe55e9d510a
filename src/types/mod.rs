//! Shared types: errors, tickers, date-indexed tables and decimal helpers.

/// Decimal and float conversions.
pub mod decimal;

/// Error types.
pub mod error;

/// Date-indexed tables and series.
pub mod table;

/// Ticker identifier.
pub mod ticker;

pub use error::{XRayError, XRayResult};
pub use table::{DateSeries, DateTable, PriceTable, ReturnSeries, ReturnsTable};
pub use ticker::Ticker;
