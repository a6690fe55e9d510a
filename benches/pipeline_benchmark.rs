use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use portfolio_xray::prelude::*;
use std::hint::black_box;

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
    (0..n as u64).map(|i| start + Days::new(i)).collect()
}

fn prices(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    let mut price = 100.0;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64;
            price *= 1.0 + 0.03 * (u - 0.5);
            price
        })
        .collect()
}

fn setup(assets: usize, days: usize) -> (InMemoryPriceProvider, AnalysisContext) {
    let index = dates(days);
    let mut provider = InMemoryPriceProvider::new();
    let mut records = Vec::with_capacity(assets);
    for i in 0..assets {
        let name = format!("ASSET{}", i);
        provider = provider.with_closes(name.as_str(), &index, &prices(days, i as u64 + 1));
        records.push(PortfolioRecord::new(name, Decimal::from(1000 + i as u64), AssetType::Stock));
    }
    let context = AnalysisContext::new(
        records,
        AnalysisConfig::default().with_range(DateRange::since(index[0])),
    );
    (provider, context)
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("xray_pipeline");
    for assets in [5usize, 20, 50] {
        let days = 2520;
        let (provider, context) = setup(assets, days);
        group.throughput(Throughput::Elements((assets * days) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(assets), &assets, |b, _| {
            b.iter(|| black_box(context.run(&provider)))
        });
    }
    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let (provider, context) = setup(20, 2520);
    let tickers: Vec<Ticker> = context.records.iter().map(|r| r.ticker.clone()).collect();
    let acquirer = PriceAcquirer::new(context.config.range);

    let acquired = match acquirer.acquire(&provider, &tickers) {
        Ok(acquired) => acquired,
        Err(_) => return,
    };
    let returns = match compute_asset_returns(&acquired.prices) {
        Ok(returns) => returns,
        Err(_) => return,
    };
    let weights = Weights::from_percentages(tickers.iter().map(|t| (t.clone(), 5.0)));
    let series = compute_portfolio_returns(&returns, &weights);

    let mut group = c.benchmark_group("xray_stages");
    group.bench_function("acquire", |b| {
        b.iter(|| black_box(acquirer.acquire(&provider, &tickers)))
    });
    group.bench_function("asset_returns", |b| {
        b.iter(|| black_box(compute_asset_returns(&acquired.prices)))
    });
    group.bench_function("correlation", |b| {
        b.iter(|| black_box(CorrelationMatrix::from_returns(&returns)))
    });
    group.bench_function("horizons", |b| {
        b.iter(|| black_box(horizon_risk_summary(&series, &Horizon::defaults())))
    });
    group.finish();
}

criterion_group!(benches, bench_full_pipeline, bench_stages);
criterion_main!(benches);
