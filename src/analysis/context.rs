//! End-to-end X-ray run.

use tracing::info;

use crate::analysis::config::AnalysisConfig;
use crate::analysis::insights::{
    CorrelationRegime, HorizonTrend, Insights, PortfolioProfile, StressConcentration,
};
use crate::data::{AcquiredPrices, DroppedTicker, PriceAcquirer, PriceProvider};
use crate::portfolio::{Portfolio, PortfolioRecord, build_portfolio};
use crate::risk::{
    CorrelationShift, HorizonMetric, StressContribution, StressPeriods,
    compute_asset_returns, compute_correlation_matrices, compute_portfolio_returns,
    horizon_risk_summary, identify_stress_periods, stress_loss_attribution,
};
use crate::types::error::XRayResult;
use crate::types::table::{PriceTable, ReturnSeries, ReturnsTable};

#[cfg(feature = "data-feeds")]
use crate::data::AsyncPriceProvider;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XRayReport {
    /// Validated portfolio with allocations.
    pub portfolio: Portfolio,
    /// Cleaned common price history.
    pub prices: PriceTable,
    /// Tickers excluded during acquisition.
    pub dropped: Vec<DroppedTicker>,
    /// Daily asset returns.
    pub asset_returns: ReturnsTable,
    /// Daily weighted portfolio returns.
    pub portfolio_returns: ReturnSeries,
    /// Stress dates and threshold.
    pub stress: StressPeriods,
    /// Normal and stress correlation matrices.
    pub correlations: CorrelationShift,
    /// Per-asset stress-date contributions.
    pub attribution: StressContribution,
    /// Horizon rows that fit the sample.
    pub horizons: Vec<HorizonMetric>,
}

impl XRayReport {
    /// Derives the narrative classification of this report.
    #[must_use]
    pub fn insights(&self) -> Insights {
        Insights {
            portfolio: PortfolioProfile::from_equity_pct(self.portfolio.equity_allocation()),
            correlation: CorrelationRegime::from_shift(&self.correlations),
            stress: StressConcentration::from_contribution(&self.attribution),
            horizon: HorizonTrend::from_metrics(&self.horizons),
        }
    }
}

/// Inputs of one run: the declared holdings and the analysis parameters.
///
/// Holds no state between runs; each call to [`run`](Self::run) owns every
/// table it produces.
///
/// # Example
///
/// ```rust
/// use chrono::{Days, NaiveDate};
/// use portfolio_xray::analysis::{AnalysisConfig, AnalysisContext};
/// use portfolio_xray::data::{DateRange, InMemoryPriceProvider};
/// use portfolio_xray::portfolio::{AssetType, PortfolioRecord};
/// use portfolio_xray::risk::Horizon;
/// use portfolio_xray::dec;
///
/// let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
/// let dates: Vec<NaiveDate> = (0..40).map(|i| start + Days::new(i)).collect();
/// let spy: Vec<f64> = (0..40).map(|i| 100.0 + (i % 7) as f64).collect();
/// let gld: Vec<f64> = (0..40).map(|i| 50.0 + (i % 5) as f64).collect();
///
/// let provider = InMemoryPriceProvider::new()
///     .with_closes("SPY", &dates, &spy)
///     .with_closes("GLD", &dates, &gld);
///
/// let context = AnalysisContext::new(
///     vec![
///         PortfolioRecord::new("SPY", dec!(7000), AssetType::Etf),
///         PortfolioRecord::new("GLD", dec!(3000), AssetType::Gold),
///     ],
///     AnalysisConfig::default()
///         .with_range(DateRange::since(start))
///         .with_horizons(vec![Horizon::new("1 Week", 5).unwrap()]),
/// );
///
/// let report = context.run(&provider).unwrap();
/// assert_eq!(report.asset_returns.len(), 39);
/// println!("{}", report.insights().summary());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    /// Declared holdings.
    pub records: Vec<PortfolioRecord>,
    /// Analysis parameters.
    pub config: AnalysisConfig,
}

impl AnalysisContext {
    /// Creates a new context.
    #[must_use]
    pub fn new(records: Vec<PortfolioRecord>, config: AnalysisConfig) -> Self {
        Self { records, config }
    }

    /// Runs the full pipeline against a synchronous provider.
    ///
    /// # Errors
    ///
    /// Fails fast with the first stage error:
    /// - `XRayError::InvalidConfiguration` for a bad config
    /// - `XRayError::Validation` for bad holdings
    /// - `XRayError::DataSource` or `XRayError::InsufficientData` from
    ///   acquisition
    /// - `XRayError::EmptyData` or `XRayError::InsufficientData` from the
    ///   risk stages
    pub fn run<P>(&self, provider: &P) -> XRayResult<XRayReport>
    where
        P: PriceProvider + ?Sized,
    {
        let portfolio = self.prepare()?;
        let acquired = self.acquirer().acquire(provider, &portfolio.tickers())?;
        self.analyze(portfolio, acquired)
    }

    /// Runs the full pipeline against an asynchronous provider.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    #[cfg(feature = "data-feeds")]
    pub async fn run_async<P>(&self, provider: &P) -> XRayResult<XRayReport>
    where
        P: AsyncPriceProvider + ?Sized,
    {
        let portfolio = self.prepare()?;
        let acquired = self
            .acquirer()
            .acquire_async(provider, &portfolio.tickers())
            .await?;
        self.analyze(portfolio, acquired)
    }

    fn prepare(&self) -> XRayResult<Portfolio> {
        self.config.validate()?;
        let portfolio = build_portfolio(self.records.clone())?;
        info!(
            holdings = portfolio.len(),
            total_amount = %portfolio.total_amount(),
            "starting portfolio x-ray"
        );
        Ok(portfolio)
    }

    fn acquirer(&self) -> PriceAcquirer {
        PriceAcquirer::new(self.config.range).with_fill_limit(self.config.fill_limit)
    }

    fn analyze(&self, portfolio: Portfolio, acquired: AcquiredPrices) -> XRayResult<XRayReport> {
        let AcquiredPrices { prices, dropped } = acquired;

        let asset_returns = compute_asset_returns(&prices)?;
        let weights = portfolio.weights()?;
        let portfolio_returns = compute_portfolio_returns(&asset_returns, &weights);
        let stress = identify_stress_periods(&portfolio_returns, self.config.stress_quantile)?;
        let correlations = compute_correlation_matrices(&asset_returns, &stress.dates)?;
        let attribution = stress_loss_attribution(&asset_returns, &weights, &stress.dates);
        let horizons = horizon_risk_summary(&portfolio_returns, &self.config.horizons)?;

        info!(
            surviving = prices.width(),
            dropped = dropped.len(),
            return_days = asset_returns.len(),
            stress_days = stress.len(),
            threshold = stress.threshold,
            horizons = horizons.len(),
            "portfolio x-ray complete"
        );

        Ok(XRayReport {
            portfolio,
            prices,
            dropped,
            asset_returns,
            portfolio_returns,
            stress,
            correlations,
            attribution,
            horizons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DateRange, InMemoryPriceProvider};
    use crate::portfolio::AssetType;
    use crate::risk::Horizon;
    use crate::types::XRayError;
    use crate::types::ticker::Ticker;
    use chrono::{Days, NaiveDate};
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
    }

    fn dates(n: u64) -> Vec<NaiveDate> {
        (0..n).map(|i| start() + Days::new(i)).collect()
    }

    fn wave(n: usize, base: f64, period: usize) -> Vec<f64> {
        (0..n).map(|i| base + (i % period) as f64).collect()
    }

    fn provider() -> InMemoryPriceProvider {
        InMemoryPriceProvider::new()
            .with_closes("EQ", &dates(60), &wave(60, 100.0, 7))
            .with_closes("BOND", &dates(60), &wave(60, 80.0, 3))
            .with_closes("LATE", &dates(80)[75..], &[10.0, 11.0, 12.0, 11.0, 10.0])
    }

    fn context(config: AnalysisConfig) -> AnalysisContext {
        AnalysisContext::new(
            vec![
                PortfolioRecord::new("EQ", dec!(6000), AssetType::Stock),
                PortfolioRecord::new("BOND", dec!(3000), AssetType::BondEtf),
                PortfolioRecord::new("LATE", dec!(1000), AssetType::Etf),
            ],
            config,
        )
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
            .with_range(DateRange::since(start()))
            .with_horizons(vec![
                Horizon::new("1 Week", 5).unwrap(),
                Horizon::new("1 Year", 252).unwrap(),
            ])
    }

    #[test]
    fn test_run_produces_consistent_report() {
        let report = context(config()).run(&provider()).unwrap();

        assert_eq!(report.prices.tickers(), &[Ticker::new("EQ"), Ticker::new("BOND")]);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].ticker, Ticker::new("LATE"));
        assert_eq!(report.prices.len(), 60);
        assert_eq!(report.asset_returns.len(), 59);
        assert_eq!(report.portfolio_returns.len(), 59);
        assert!(!report.stress.is_empty());
        assert_eq!(report.correlations.normal.size(), 2);
        assert_eq!(report.attribution.len(), 2);
        assert_eq!(report.horizons.len(), 1);
        assert_eq!(report.horizons[0].horizon, "1 Week");
    }

    #[test]
    fn test_dropped_ticker_keeps_allocation_but_zero_weight() {
        let report = context(config()).run(&provider()).unwrap();

        assert_eq!(report.portfolio.allocation("LATE"), Some(dec!(10)));
        let expected: f64 = report
            .stress
            .dates
            .iter()
            .filter_map(|d| report.portfolio_returns.get(*d))
            .sum();
        approx::assert_relative_eq!(report.attribution.total(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_insights_from_report() {
        let report = context(config()).run(&provider()).unwrap();
        let insights = report.insights();

        // Stock 60 + ETF 10 = 70, not above 70
        assert_eq!(insights.portfolio, PortfolioProfile::Balanced);
        assert_eq!(
            insights.correlation,
            CorrelationRegime::from_shift(&report.correlations)
        );
        assert!(insights.horizon.is_none());
        assert!(!insights.summary().is_empty());
    }

    #[test]
    fn test_invalid_config_fails_before_fetch() {
        let provider = provider();
        let result = context(config().with_stress_quantile(1.5)).run(&provider);

        assert!(matches!(result, Err(XRayError::InvalidConfiguration(_))));
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn test_invalid_records_fail_before_fetch() {
        let provider = provider();
        let context = AnalysisContext::new(vec![], config());

        assert!(matches!(
            context.run(&provider),
            Err(XRayError::Validation(_))
        ));
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn test_provider_failure_is_fatal() {
        let provider = provider().with_failure("timeout");
        let result = context(config()).run(&provider);
        assert_eq!(result, Err(XRayError::DataSource("timeout".to_string())));
    }

    #[test]
    fn test_no_fitting_horizon() {
        let config = config().with_horizons(vec![Horizon::new("1 Year", 252).unwrap()]);
        let result = context(config).run(&provider());
        assert!(matches!(result, Err(XRayError::InsufficientData(_))));
    }

    #[cfg(feature = "data-feeds")]
    #[tokio::test]
    async fn test_run_async_matches_run() {
        let provider = provider();
        let context = context(config());

        let sync = context.run(&provider).unwrap();
        let from_async = context.run_async(&provider).await.unwrap();
        assert_eq!(sync, from_async);
    }
}
