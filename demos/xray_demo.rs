//! Portfolio X-Ray Example
//!
//! This example runs a full X-ray on a small multi-asset portfolio using the
//! in-memory provider, so no network access is needed.
//!
//! Features demonstrated:
//! - Building a portfolio from raw holdings
//! - Auto-healing acquisition dropping an unknown and a late-listed ticker
//! - Stress periods, correlation shift and stress-loss attribution
//! - Horizon risk and narrative insights
//!
//! Run with: `cargo run --example xray_demo`
//! Set `RUST_LOG=portfolio_xray=debug` to follow the acquisition loop.

use chrono::{Days, NaiveDate};
use portfolio_xray::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info");

    println!("=== Portfolio X-Ray Example ===\n");

    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
    let provider = sample_provider(start, 1000);

    let records = vec![
        PortfolioRecord::from_raw("RELIANCE.NS", 50_000.0, "Stock")?,
        PortfolioRecord::from_raw("NIFTYBEES.NS", 30_000.0, "ETF")?,
        PortfolioRecord::from_raw("GILT5YBEES.NS", 25_000.0, "Bond ETF")?,
        PortfolioRecord::from_raw("GOLDBEES.NS", 20_000.0, "Gold")?,
        PortfolioRecord::from_raw("NEWLIST.NS", 5_000.0, "Stock")?,
        PortfolioRecord::from_raw("DELISTED.NS", 5_000.0, "Stock")?,
    ];

    // NEWLIST.NS lists after the other histories end and gets dropped
    let config = AnalysisConfig::default().with_range(DateRange::since(start));

    let report = AnalysisContext::new(records, config).run(&provider)?;

    display_portfolio(&report);
    display_acquisition(&report);
    display_stress(&report);
    display_horizons(&report);

    let insights = report.insights();
    println!("--- Insights ---\n");
    if let Some(correlation) = insights.correlation {
        println!("{}\n", correlation);
    }
    println!("{}", insights.summary());

    println!("\n=== Example Complete ===");
    Ok(())
}

/// Generates deterministic daily closes for the demo tickers.
fn sample_provider(start: NaiveDate, days: u64) -> InMemoryPriceProvider {
    let dates: Vec<NaiveDate> = (0..days).map(|i| start + Days::new(i)).collect();

    let listing: Vec<NaiveDate> = (days + 30..days + 40)
        .map(|i| start + Days::new(i))
        .collect();

    InMemoryPriceProvider::new()
        .with_closes("RELIANCE.NS", &dates, &path(days as usize, 11, 0.0005, 0.045))
        .with_closes("NIFTYBEES.NS", &dates, &path(days as usize, 12, 0.0004, 0.030))
        .with_closes("GILT5YBEES.NS", &dates, &path(days as usize, 13, 0.0001, 0.008))
        .with_closes("GOLDBEES.NS", &dates, &path(days as usize, 14, 0.0003, 0.020))
        .with_closes("NEWLIST.NS", &listing, &path(listing.len(), 15, 0.0, 0.05))
}

fn path(n: usize, seed: u64, drift: f64, vol: f64) -> Vec<f64> {
    let mut state = seed;
    let mut price = 100.0;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64;
            price *= 1.0 + drift + vol * (u - 0.5);
            price
        })
        .collect()
}

fn display_portfolio(report: &XRayReport) {
    println!("--- Portfolio ---\n");
    for holding in report.portfolio.holdings() {
        println!(
            "{:<15} {:>10} {:>9} {:>7.2}%",
            holding.record.ticker.as_str(),
            holding.record.amount,
            holding.record.asset_type.label(),
            holding.allocation_pct
        );
    }
    println!("Equity allocation: {:.2}%\n", report.portfolio.equity_allocation());
}

fn display_acquisition(report: &XRayReport) {
    println!("--- Price Acquisition ---\n");
    println!(
        "{} tickers over {} trading days",
        report.prices.width(),
        report.prices.len()
    );
    for dropped in &report.dropped {
        println!(
            "Dropped {} in round {}: {}",
            dropped.ticker, dropped.iteration, dropped.reason
        );
    }
    println!();
}

fn display_stress(report: &XRayReport) {
    println!("--- Stress Periods ---\n");
    println!(
        "{} stress days at or below {:.4} ({}th percentile)",
        report.stress.len(),
        report.stress.threshold,
        report.stress.quantile * 100.0
    );

    if let Some(shift) = report.correlations.average_shift() {
        println!("Average correlation shift under stress: {:+.3}", shift);
    }

    println!("\nStress-loss attribution:");
    for (ticker, contribution) in report.attribution.iter() {
        println!("  {:<15} {:+.4}", ticker.as_str(), contribution);
    }
    println!();
}

fn display_horizons(report: &XRayReport) {
    println!("--- Horizon Risk ---\n");
    println!("{:<10} {:>12} {:>12} {:>8}", "Horizon", "Worst", "P(loss)", "Windows");
    for row in &report.horizons {
        println!(
            "{:<10} {:>11.2}% {:>11.1}% {:>8}",
            row.horizon,
            row.worst_return * 100.0,
            row.probability_of_loss * 100.0,
            row.windows
        );
    }
    println!();
}
