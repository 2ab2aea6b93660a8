use criterion::{black_box, criterion_group, criterion_main, Criterion};
use market_analytics::{regional_snapshot, yearly_summary, MarketRecord, Table};

fn synthetic_market(years: i32, regions: usize) -> Table<MarketRecord> {
    let mut rows = Vec::with_capacity(years as usize * regions);
    for year in 2000..2000 + years {
        for region in 0..regions {
            let seed = (year - 2000) as f64 + region as f64 * 0.5;
            rows.push(MarketRecord {
                year,
                region: format!("R{}", region),
                installed_capacity_mw: 1000.0 + seed * 10.0,
                generation_gwh: 4000.0 + seed * 35.0,
                market_value_million_usd: 300.0 + seed,
                investment_million_usd: 90.0 + seed * 0.3,
                number_of_plants: 5 + region as u32,
            });
        }
    }
    Table::new(rows)
}

fn benchmark_yearly_summary(c: &mut Criterion) {
    let market = synthetic_market(50, 200);

    c.bench_function("yearly_summary_50y_200r", |b| {
        b.iter(|| yearly_summary(black_box(&market)))
    });
}

fn benchmark_regional_snapshot(c: &mut Criterion) {
    let market = synthetic_market(50, 200);

    c.bench_function("regional_snapshot_50y_200r", |b| {
        b.iter(|| regional_snapshot(black_box(&market)))
    });
}

criterion_group!(benches, benchmark_yearly_summary, benchmark_regional_snapshot);
criterion_main!(benches);
