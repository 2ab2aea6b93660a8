use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::table_store::TableRow;

/// One row of raw market data for a single year and region.
///
/// Numeric columns must be finite; negative values are accepted as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub year: i32,
    pub region: String,
    pub installed_capacity_mw: f64,
    pub generation_gwh: f64,
    pub market_value_million_usd: f64,
    pub investment_million_usd: f64,
    pub number_of_plants: u32,
}

impl TableRow for MarketRecord {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "region",
        "installed_capacity_mw",
        "generation_gwh",
        "market_value_million_usd",
        "investment_million_usd",
        "number_of_plants",
    ];

    fn validate(&self, record: u64) -> Result<()> {
        require_finite("installed_capacity_mw", self.installed_capacity_mw, record)?;
        require_finite("generation_gwh", self.generation_gwh, record)?;
        require_finite("market_value_million_usd", self.market_value_million_usd, record)?;
        require_finite("investment_million_usd", self.investment_million_usd, record)
    }
}

/// Year-aggregated totals plus growth against the previous summary row.
///
/// Growth fields are `None` for the earliest year and whenever the previous
/// value is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummaryRow {
    pub year: i32,
    pub installed_capacity_mw: f64,
    pub generation_gwh: f64,
    pub market_value_million_usd: f64,
    pub investment_million_usd: f64,
    pub number_of_plants: u64,
    pub installed_capacity_mw_growth_pct: Option<f64>,
    pub generation_gwh_growth_pct: Option<f64>,
    pub market_value_million_usd_growth_pct: Option<f64>,
    pub investment_million_usd_growth_pct: Option<f64>,
}

impl TableRow for YearlySummaryRow {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "installed_capacity_mw",
        "generation_gwh",
        "market_value_million_usd",
        "investment_million_usd",
        "number_of_plants",
        "installed_capacity_mw_growth_pct",
        "generation_gwh_growth_pct",
        "market_value_million_usd_growth_pct",
        "investment_million_usd_growth_pct",
    ];
}

/// A latest-year market record with its share of the regional totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalShareRow {
    pub year: i32,
    pub region: String,
    pub installed_capacity_mw: f64,
    pub generation_gwh: f64,
    pub market_value_million_usd: f64,
    pub investment_million_usd: f64,
    pub number_of_plants: u32,
    pub capacity_share_pct: Option<f64>,
    pub value_share_pct: Option<f64>,
}

impl RegionalShareRow {
    pub fn from_record(
        record: &MarketRecord,
        capacity_share_pct: Option<f64>,
        value_share_pct: Option<f64>,
    ) -> Self {
        Self {
            year: record.year,
            region: record.region.clone(),
            installed_capacity_mw: record.installed_capacity_mw,
            generation_gwh: record.generation_gwh,
            market_value_million_usd: record.market_value_million_usd,
            investment_million_usd: record.investment_million_usd,
            number_of_plants: record.number_of_plants,
            capacity_share_pct,
            value_share_pct,
        }
    }
}

impl TableRow for RegionalShareRow {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "region",
        "installed_capacity_mw",
        "generation_gwh",
        "market_value_million_usd",
        "investment_million_usd",
        "number_of_plants",
        "capacity_share_pct",
        "value_share_pct",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorRecord {
    pub company_name: String,
    pub market_share_percent: f64,
    pub strength_score: f64,
    pub installed_capacity_mw: f64,
}

impl TableRow for CompetitorRecord {
    const COLUMNS: &'static [&'static str] = &[
        "company_name",
        "market_share_percent",
        "strength_score",
        "installed_capacity_mw",
    ];

    fn validate(&self, record: u64) -> Result<()> {
        require_finite("market_share_percent", self.market_share_percent, record)?;
        require_finite("strength_score", self.strength_score, record)?;
        require_finite("installed_capacity_mw", self.installed_capacity_mw, record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_type: String,
    pub size_category: String,
}

impl TableRow for CustomerRecord {
    const COLUMNS: &'static [&'static str] = &["customer_type", "size_category"];
}

/// Externally supplied market value forecast for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub market_value_forecast: f64,
}

impl TableRow for ForecastPoint {
    const COLUMNS: &'static [&'static str] = &["year", "market_value_forecast"];

    fn validate(&self, record: u64) -> Result<()> {
        require_finite("market_value_forecast", self.market_value_forecast, record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorPosition {
    pub company_name: String,
    pub market_share_percent: f64,
    pub strength_score: f64,
    pub bubble_size: f64,
}

pub(crate) fn require_finite(column: &str, value: f64, record: u64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MarketError::MissingValue {
            column: column.to_string(),
            record,
        })
    }
}
