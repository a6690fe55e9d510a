//! Portfolio construction from user-declared holdings.
//!
//! # Overview
//!
//! A host collects `(ticker, amount, asset_type)` triples and hands them to
//! [`build_portfolio`], which validates them and derives each holding's
//! allocation percentage:
//!
//! ```text
//! allocation_pct = amount / Σ amount × 100
//! ```
//!
//! Allocations always sum to 100. They feed the return and attribution
//! calculations through [`Weights`].
//!
//! # Example
//!
//! ```rust
//! use portfolio_xray::portfolio::{build_portfolio, AssetType, PortfolioRecord};
//! use portfolio_xray::dec;
//!
//! let portfolio = build_portfolio(vec![
//!     PortfolioRecord::new("RELIANCE.NS", dec!(50000), AssetType::Stock),
//!     PortfolioRecord::new("GOLDBEES.NS", dec!(25000), AssetType::Gold),
//!     PortfolioRecord::new("NIFTYBEES.NS", dec!(25000), AssetType::Etf),
//! ])
//! .unwrap();
//!
//! assert_eq!(portfolio.equity_allocation(), dec!(75));
//! ```

mod builder;
mod record;
mod weights;

pub use builder::{Holding, Portfolio, build_portfolio};
pub use record::{AssetType, PortfolioRecord};
pub use weights::Weights;
