//! # Portfolio X-Ray
//!
//! A library for looking through a declared portfolio into how it behaves in
//! bad markets.
//!
//! Given `(ticker, amount, asset type)` holdings and a market data provider,
//! the library builds a common daily price history and computes:
//!
//! - Daily asset returns and the weighted portfolio return series
//! - Stress dates in the lower tail of portfolio returns
//! - Correlation matrices for normal and stressed markets
//! - Each asset's contribution to stress-date losses
//! - Worst-case return and probability of loss over rolling holding horizons
//! - Short narrative insights derived from the numbers
//!
//! ## Modules
//!
//! - [`portfolio`]: Holdings validation and allocation weights
//! - [`data`]: Provider seam and auto-healing price acquisition
//! - [`risk`]: Returns, stress periods, correlation, attribution and horizons
//! - [`analysis`]: Configuration, the end-to-end run and insights
//! - [`types`]: Errors, tickers and date-indexed tables
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` on public data types and JSON config
//!   loading
//! - `data-feeds`: async provider trait and async pipeline drivers
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Days, NaiveDate};
//! use portfolio_xray::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
//! let dates: Vec<NaiveDate> = (0..60).map(|i| start + Days::new(i)).collect();
//! let stock: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
//! let gold: Vec<f64> = (0..60).map(|i| 50.0 + ((i * 3) % 5) as f64).collect();
//!
//! let provider = InMemoryPriceProvider::new()
//!     .with_closes("STOCK", &dates, &stock)
//!     .with_closes("GOLD", &dates, &gold);
//!
//! let context = AnalysisContext::new(
//!     vec![
//!         PortfolioRecord::new("STOCK", dec!(8000), AssetType::Stock),
//!         PortfolioRecord::new("GOLD", dec!(2000), AssetType::Gold),
//!     ],
//!     AnalysisConfig::default()
//!         .with_range(DateRange::since(start))
//!         .with_horizons(vec![Horizon::new("1 Month", 21).unwrap()]),
//! );
//!
//! let report = context.run(&provider).unwrap();
//! assert_eq!(report.insights().portfolio, PortfolioProfile::EquityHeavy);
//! ```

pub mod analysis;
pub mod data;
pub mod portfolio;
pub mod risk;
pub mod types;

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Common imports for running an X-ray.
pub mod prelude {
    pub use crate::analysis::{
        AnalysisConfig, AnalysisContext, CorrelationRegime, HorizonTrend, Insights,
        PortfolioProfile, StressConcentration, XRayReport,
    };
    pub use crate::data::{
        AcquiredPrices, DateRange, DropReason, DroppedTicker, InMemoryPriceProvider,
        PriceAcquirer, PriceProvider, PriceResponse, QuoteRow,
    };
    #[cfg(feature = "data-feeds")]
    pub use crate::data::AsyncPriceProvider;
    pub use crate::portfolio::{AssetType, Portfolio, PortfolioRecord, Weights, build_portfolio};
    pub use crate::risk::{
        CorrelationMatrix, Horizon, HorizonMetric, StressContribution, StressPeriods,
        compute_asset_returns, compute_correlation_matrices, compute_portfolio_returns,
        horizon_risk_summary, identify_stress_periods, stress_loss_attribution,
    };
    pub use crate::types::{PriceTable, ReturnSeries, ReturnsTable, Ticker, XRayError, XRayResult};
    pub use crate::{Decimal, dec};
}
