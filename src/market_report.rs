use anyhow::Result;
use polars::prelude::*;

use market_analytics::{RegionalShareRow, SegmentCount, Table, YearlySummaryRow};

/// Yearly summary as a DataFrame, growth columns nullable.
pub fn summary_frame(summary: &Table<YearlySummaryRow>) -> PolarsResult<DataFrame> {
    let rows = summary.rows();
    df!(
        "year" => rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        "installed_capacity_mw" => rows.iter().map(|r| r.installed_capacity_mw).collect::<Vec<_>>(),
        "generation_gwh" => rows.iter().map(|r| r.generation_gwh).collect::<Vec<_>>(),
        "market_value_million_usd" => rows.iter().map(|r| r.market_value_million_usd).collect::<Vec<_>>(),
        "investment_million_usd" => rows.iter().map(|r| r.investment_million_usd).collect::<Vec<_>>(),
        "number_of_plants" => rows.iter().map(|r| r.number_of_plants).collect::<Vec<_>>(),
        "installed_capacity_mw_growth_pct" => rows.iter().map(|r| r.installed_capacity_mw_growth_pct).collect::<Vec<_>>(),
        "generation_gwh_growth_pct" => rows.iter().map(|r| r.generation_gwh_growth_pct).collect::<Vec<_>>(),
        "market_value_million_usd_growth_pct" => rows.iter().map(|r| r.market_value_million_usd_growth_pct).collect::<Vec<_>>(),
        "investment_million_usd_growth_pct" => rows.iter().map(|r| r.investment_million_usd_growth_pct).collect::<Vec<_>>(),
    )
}

pub fn regional_frame(regional: &Table<RegionalShareRow>) -> PolarsResult<DataFrame> {
    let rows = regional.rows();
    df!(
        "year" => rows.iter().map(|r| r.year).collect::<Vec<_>>(),
        "region" => rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        "installed_capacity_mw" => rows.iter().map(|r| r.installed_capacity_mw).collect::<Vec<_>>(),
        "generation_gwh" => rows.iter().map(|r| r.generation_gwh).collect::<Vec<_>>(),
        "market_value_million_usd" => rows.iter().map(|r| r.market_value_million_usd).collect::<Vec<_>>(),
        "investment_million_usd" => rows.iter().map(|r| r.investment_million_usd).collect::<Vec<_>>(),
        "number_of_plants" => rows.iter().map(|r| r.number_of_plants).collect::<Vec<_>>(),
        "capacity_share_pct" => rows.iter().map(|r| r.capacity_share_pct).collect::<Vec<_>>(),
        "value_share_pct" => rows.iter().map(|r| r.value_share_pct).collect::<Vec<_>>(),
    )
}

fn segment_frame(label: &str, segments: &[SegmentCount]) -> PolarsResult<DataFrame> {
    df!(
        label => segments.iter().map(|s| s.category.as_str()).collect::<Vec<_>>(),
        "count" => segments.iter().map(|s| s.count as u64).collect::<Vec<_>>(),
    )
}

pub fn print_market_report(
    summary: &Table<YearlySummaryRow>,
    regional: Option<&Table<RegionalShareRow>>,
) -> Result<()> {
    println!("\n📊 Market Summary:");
    println!("{}", summary_frame(summary)?);

    println!("\n🗺️  Regional Analysis:");
    match regional {
        Some(regional) => {
            let frame = regional_frame(regional)?;
            println!(
                "{}",
                frame.select(["region", "market_value_million_usd", "value_share_pct"])?
            );
        }
        None => println!("No regional analysis data available"),
    }
    Ok(())
}

pub fn print_segments(customer_types: &[SegmentCount], size_categories: &[SegmentCount]) -> Result<()> {
    println!("\n👥 Customer Segmentation:");
    println!("{}", segment_frame("customer_type", customer_types)?);
    println!("{}", segment_frame("size_category", size_categories)?);
    Ok(())
}

pub fn print_json(
    summary: &Table<YearlySummaryRow>,
    regional: Option<&Table<RegionalShareRow>>,
) -> Result<()> {
    let report = serde_json::json!({
        "market_summary": summary.rows(),
        "regional_analysis": regional.map(|r| r.rows()),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
