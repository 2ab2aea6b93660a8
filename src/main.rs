use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::PathBuf;

use market_analytics::{
    competitor_positions, customer_type_distribution, regional_snapshot,
    size_category_distribution, yearly_summary, MarketError, RegionalShareRow, StoreConfig,
    Table, TableRow, TableStore, YearlySummaryRow,
};

mod market_report;
mod market_visualization;

use market_visualization::{ChartStyle, ForecastSeries, MarketVisualizer};

#[derive(Parser)]
#[command(name = "hydro_market_pipeline")]
#[command(about = "Summarise Brazilian hydro energy market data and render charts")]
struct Args {
    /// Data directory: inputs are read from raw/, outputs go to processed/ and charts/
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Console output format
    #[arg(short, long, value_enum, default_value = "summary")]
    output: OutputFormat,

    /// Skip PNG chart rendering
    #[arg(long)]
    skip_charts: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = TableStore::new(StoreConfig::new(args.data_dir));
    info!("Using data directory {}", store.config().data_dir.display());

    let Some(market) = present(store.load_market())? else {
        println!("No market data available. Please check data files.");
        return Ok(());
    };

    let summary = yearly_summary(&market)?;
    save_logged(&store, &summary, "market_summary.csv");

    let regional = match regional_snapshot(&market) {
        Ok(regional) => {
            save_logged(&store, &regional, "regional_analysis.csv");
            Some(regional)
        }
        Err(MarketError::EmptyInput) => {
            warn!("Market data has no records; regional analysis skipped");
            None
        }
        Err(e) => return Err(e.into()),
    };

    match args.output {
        OutputFormat::Summary => market_report::print_market_report(&summary, regional.as_ref())?,
        OutputFormat::Json => market_report::print_json(&summary, regional.as_ref())?,
    }

    let customers = present(store.load_customers())?;
    if let (OutputFormat::Summary, Some(customers)) = (&args.output, &customers) {
        market_report::print_segments(
            &customer_type_distribution(customers),
            &size_category_distribution(customers),
        )?;
    }

    if args.skip_charts {
        return Ok(());
    }

    let visualizer = MarketVisualizer::new(store.config().charts_dir(), ChartStyle::default())?;
    render_charts(&visualizer, &store, &summary, regional.as_ref(), customers.as_ref())?;

    println!("\n✅ Charts generated in {}", store.config().charts_dir().display());
    Ok(())
}

/// Turn a missing dataset into `None` so the run can carry on without it.
fn present<T>(loaded: market_analytics::Result<T>) -> market_analytics::Result<Option<T>> {
    match loaded {
        Ok(table) => Ok(Some(table)),
        Err(MarketError::NotFound { path }) => {
            warn!("Data file not found: {}", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn save_logged<R: TableRow>(store: &TableStore, table: &Table<R>, name: &str) {
    if let Err(e) = store.save(table, name) {
        error!("Error saving data: {e}");
    }
}

fn render_charts(
    visualizer: &MarketVisualizer,
    store: &TableStore,
    summary: &Table<YearlySummaryRow>,
    regional: Option<&Table<RegionalShareRow>>,
    customers: Option<&Table<market_analytics::CustomerRecord>>,
) -> Result<()> {
    if !summary.is_empty() {
        report_chart("market trends", visualizer.generate_market_trends_chart(summary));
    }

    if let Some(regional) = regional {
        report_chart("regional analysis", visualizer.generate_regional_chart(regional));
    }

    if let Some(competitors) = present(store.load_competitors())? {
        let positions = competitor_positions(&competitors)?;
        if !positions.is_empty() {
            report_chart("competitor analysis", visualizer.generate_competitor_chart(&positions));
        }
    }

    if let Some(customers) = customers {
        report_chart(
            "customer segmentation",
            visualizer.generate_customer_chart(
                &customer_type_distribution(customers),
                &size_category_distribution(customers),
            ),
        );
    }

    if let Some(forecast) = present(store.load_forecast())? {
        let series = ForecastSeries::new(summary, &forecast);
        report_chart("market forecast", visualizer.generate_forecast_chart(&series));
    }

    Ok(())
}

fn report_chart(name: &str, rendered: Result<PathBuf>) {
    match rendered {
        Ok(path) => println!("Chart saved: {}", path.display()),
        Err(e) => error!("Error saving {name} chart: {e:#}"),
    }
}
