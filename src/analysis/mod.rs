//! End-to-end portfolio X-ray.
//!
//! [`AnalysisContext`] ties the pipeline together: it validates the holdings
//! and [`AnalysisConfig`], acquires a common price history, runs every risk
//! stage and returns the results as one [`XRayReport`]. The report's
//! [`Insights`] classify the numbers into short narrative messages.
//!
//! ```text
//! records ─▶ Portfolio ─▶ PriceAcquirer ─▶ returns ─┬▶ stress ─┬▶ correlations
//!                                                   │          └▶ attribution
//!                                                   └▶ horizons
//! ```

mod config;
mod context;
mod insights;

pub use config::AnalysisConfig;
pub use context::{AnalysisContext, XRayReport};
pub use insights::{
    CorrelationRegime, HorizonTrend, Insights, PortfolioProfile, StressConcentration,
};
