//! Risk metrics over a cleaned price history.
//!
//! # Overview
//!
//! Every stage is a pure function of its inputs:
//!
//! - **Returns**: [`compute_asset_returns`] and [`compute_portfolio_returns`]
//! - **Stress periods**: [`identify_stress_periods`] selects dates in the lower
//!   tail of portfolio returns
//! - **Correlation shift**: [`compute_correlation_matrices`] compares normal and
//!   stressed co-movement
//! - **Attribution**: [`stress_loss_attribution`] splits stress-date losses by
//!   asset
//! - **Horizons**: [`horizon_risk_summary`] reports worst return and loss
//!   probability over rolling holding periods
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_xray::portfolio::Weights;
//! use portfolio_xray::risk::{compute_asset_returns, compute_portfolio_returns};
//! use portfolio_xray::types::{PriceTable, Ticker};
//!
//! let dates = (1..=3)
//!     .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
//!     .collect();
//! let prices = PriceTable::new(
//!     dates,
//!     vec![Ticker::new("A"), Ticker::new("B")],
//!     vec![vec![100.0, 102.0, 101.0], vec![50.0, 49.0, 52.0]],
//! )
//! .unwrap();
//!
//! let returns = compute_asset_returns(&prices).unwrap();
//! let weights = Weights::from_percentages([(Ticker::new("A"), 60.0), (Ticker::new("B"), 40.0)]);
//! let portfolio = compute_portfolio_returns(&returns, &weights);
//!
//! assert!((portfolio.values()[0] - 0.004).abs() < 1e-12);
//! ```

mod attribution;
mod correlation;
mod horizon;
mod returns;
mod stress;

pub use attribution::{StressContribution, stress_loss_attribution};
pub use correlation::{CorrelationMatrix, CorrelationShift, compute_correlation_matrices};
pub use horizon::{Horizon, HorizonMetric, horizon_risk_summary};
pub use returns::{compute_asset_returns, compute_portfolio_returns};
pub use stress::{DEFAULT_STRESS_QUANTILE, StressPeriods, identify_stress_periods};
