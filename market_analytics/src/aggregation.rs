use std::collections::BTreeMap;

use log::debug;

use crate::error::{MarketError, Result};
use crate::models::{MarketRecord, RegionalShareRow, YearlySummaryRow};
use crate::table_store::{Table, TableRow};

#[derive(Debug, Default, Clone, Copy)]
struct YearTotals {
    installed_capacity_mw: f64,
    generation_gwh: f64,
    market_value_million_usd: f64,
    investment_million_usd: f64,
    number_of_plants: u64,
}

impl YearTotals {
    fn add(&mut self, record: &MarketRecord) {
        self.installed_capacity_mw += record.installed_capacity_mw;
        self.generation_gwh += record.generation_gwh;
        self.market_value_million_usd += record.market_value_million_usd;
        self.investment_million_usd += record.investment_million_usd;
        self.number_of_plants += u64::from(record.number_of_plants);
    }
}

/// Sum the market columns per year and attach growth against the previous row.
///
/// Rows come out in ascending year order. Growth compares each row with the
/// row before it in that order, so a gap in the years is one step, not
/// several. An empty input yields an empty summary.
pub fn yearly_summary(market: &Table<MarketRecord>) -> Result<Table<YearlySummaryRow>> {
    let mut by_year: BTreeMap<i32, YearTotals> = BTreeMap::new();
    for (idx, record) in market.iter().enumerate() {
        record.validate(idx as u64 + 1)?;
        by_year.entry(record.year).or_default().add(record);
    }

    let mut rows = Vec::with_capacity(by_year.len());
    let mut previous: Option<YearTotals> = None;

    for (year, totals) in by_year {
        let prev = previous.as_ref();
        rows.push(YearlySummaryRow {
            year,
            installed_capacity_mw: totals.installed_capacity_mw,
            generation_gwh: totals.generation_gwh,
            market_value_million_usd: totals.market_value_million_usd,
            investment_million_usd: totals.investment_million_usd,
            number_of_plants: totals.number_of_plants,
            installed_capacity_mw_growth_pct: column_growth(prev, &totals, |t| t.installed_capacity_mw),
            generation_gwh_growth_pct: column_growth(prev, &totals, |t| t.generation_gwh),
            market_value_million_usd_growth_pct: column_growth(prev, &totals, |t| t.market_value_million_usd),
            investment_million_usd_growth_pct: column_growth(prev, &totals, |t| t.investment_million_usd),
        });
        previous = Some(totals);
    }

    debug!(
        "Yearly summary: {} records folded into {} years",
        market.len(),
        rows.len()
    );
    Ok(Table::new(rows))
}

fn column_growth(
    previous: Option<&YearTotals>,
    current: &YearTotals,
    column: fn(&YearTotals) -> f64,
) -> Option<f64> {
    previous.and_then(|prev| growth_pct(column(prev), column(current)))
}

/// Records of the most recent year with their share of that year's capacity
/// and market value.
///
/// One output row per input record of the latest year, in input order.
pub fn regional_snapshot(market: &Table<MarketRecord>) -> Result<Table<RegionalShareRow>> {
    for (idx, record) in market.iter().enumerate() {
        record.validate(idx as u64 + 1)?;
    }

    let latest_year = market
        .iter()
        .map(|r| r.year)
        .max()
        .ok_or(MarketError::EmptyInput)?;

    let latest: Vec<&MarketRecord> = market.iter().filter(|r| r.year == latest_year).collect();
    let total_capacity: f64 = latest.iter().map(|r| r.installed_capacity_mw).sum();
    let total_value: f64 = latest.iter().map(|r| r.market_value_million_usd).sum();

    let rows: Table<RegionalShareRow> = latest
        .iter()
        .map(|r| {
            RegionalShareRow::from_record(
                r,
                share_pct(r.installed_capacity_mw, total_capacity),
                share_pct(r.market_value_million_usd, total_value),
            )
        })
        .collect();

    debug!(
        "Regional snapshot for {}: {} regions, capacity {:.1} MW, value {:.1}M USD",
        latest_year,
        rows.len(),
        total_capacity,
        total_value
    );
    Ok(rows)
}

/// Percentage change from `previous` to `current`; `None` when `previous` is zero.
pub fn growth_pct(previous: f64, current: f64) -> Option<f64> {
    ratio_pct(current - previous, previous)
}

/// `part` as a percentage of `total`; `None` when `total` is zero.
pub fn share_pct(part: f64, total: f64) -> Option<f64> {
    ratio_pct(part, total)
}

fn ratio_pct(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let pct = numerator / denominator * 100.0;
    pct.is_finite().then_some(pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, region: &str, capacity: f64, value: f64) -> MarketRecord {
        MarketRecord {
            year,
            region: region.to_string(),
            installed_capacity_mw: capacity,
            generation_gwh: capacity / 2.0,
            market_value_million_usd: value,
            investment_million_usd: value / 2.0,
            number_of_plants: 1,
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        match actual {
            Some(v) => assert!((v - expected).abs() < 1e-9, "{} != {}", v, expected),
            None => panic!("expected {}, got missing marker", expected),
        }
    }

    #[test]
    fn test_two_year_growth() {
        let market = Table::new(vec![
            MarketRecord {
                year: 2020,
                region: "N".to_string(),
                installed_capacity_mw: 100.0,
                generation_gwh: 50.0,
                market_value_million_usd: 10.0,
                investment_million_usd: 5.0,
                number_of_plants: 1,
            },
            MarketRecord {
                year: 2021,
                region: "N".to_string(),
                installed_capacity_mw: 150.0,
                generation_gwh: 75.0,
                market_value_million_usd: 15.0,
                investment_million_usd: 8.0,
                number_of_plants: 1,
            },
        ]);

        let summary = yearly_summary(&market).unwrap();
        let rows = summary.rows();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].installed_capacity_mw, 100.0);
        assert_eq!(rows[0].installed_capacity_mw_growth_pct, None);
        assert_eq!(rows[0].generation_gwh_growth_pct, None);
        assert_eq!(rows[0].market_value_million_usd_growth_pct, None);
        assert_eq!(rows[0].investment_million_usd_growth_pct, None);

        assert_eq!(rows[1].year, 2021);
        assert_eq!(rows[1].number_of_plants, 1);
        assert_close(rows[1].installed_capacity_mw_growth_pct, 50.0);
        assert_close(rows[1].generation_gwh_growth_pct, 50.0);
        assert_close(rows[1].market_value_million_usd_growth_pct, 50.0);
        assert_close(rows[1].investment_million_usd_growth_pct, 60.0);
    }

    #[test]
    fn test_years_sorted_and_summed() {
        let market = Table::new(vec![
            record(2022, "N", 10.0, 1.0),
            record(2020, "N", 5.0, 2.0),
            record(2022, "S", 30.0, 3.0),
            record(2020, "S", 15.0, 4.0),
        ]);

        let summary = yearly_summary(&market).unwrap();
        let years: Vec<i32> = summary.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2020, 2022]);
        assert_eq!(summary.rows()[0].installed_capacity_mw, 20.0);
        assert_eq!(summary.rows()[0].number_of_plants, 2);
        assert_eq!(summary.rows()[1].installed_capacity_mw, 40.0);
        assert_eq!(summary.rows()[1].market_value_million_usd, 4.0);
    }

    #[test]
    fn test_growth_is_positional_across_year_gaps() {
        let market = Table::new(vec![record(2018, "N", 100.0, 10.0), record(2021, "N", 200.0, 10.0)]);

        let summary = yearly_summary(&market).unwrap();
        // 2018 -> 2021 is treated as one step.
        assert_close(summary.rows()[1].installed_capacity_mw_growth_pct, 100.0);
        assert_close(summary.rows()[1].market_value_million_usd_growth_pct, 0.0);
    }

    #[test]
    fn test_zero_previous_gives_missing_growth() {
        let market = Table::new(vec![record(2020, "N", 0.0, 10.0), record(2021, "N", 50.0, 12.0)]);

        let summary = yearly_summary(&market).unwrap();
        assert_eq!(summary.rows()[1].installed_capacity_mw_growth_pct, None);
        assert_eq!(summary.rows()[1].generation_gwh_growth_pct, None);
        assert_close(summary.rows()[1].market_value_million_usd_growth_pct, 20.0);
    }

    #[test]
    fn test_empty_market_gives_empty_summary() {
        let summary = yearly_summary(&Table::default()).unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_summary_rejects_non_finite_input() {
        let mut bad = record(2021, "S", 10.0, 1.0);
        bad.investment_million_usd = f64::INFINITY;
        let market = Table::new(vec![record(2020, "N", 10.0, 1.0), bad]);

        match yearly_summary(&market) {
            Err(MarketError::MissingValue { column, record }) => {
                assert_eq!(column, "investment_million_usd");
                assert_eq!(record, 2);
            }
            other => panic!("expected MissingValue, got {:?}", other),
        }
    }

    #[test]
    fn test_latest_year_shares() {
        let market = Table::new(vec![record(2021, "N", 150.0, 15.0), record(2021, "S", 50.0, 5.0)]);

        let snapshot = regional_snapshot(&market).unwrap();
        let rows = snapshot.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, "N");
        assert_close(rows[0].capacity_share_pct, 75.0);
        assert_close(rows[0].value_share_pct, 75.0);
        assert_eq!(rows[1].region, "S");
        assert_close(rows[1].capacity_share_pct, 25.0);
        assert_close(rows[1].value_share_pct, 25.0);
    }

    #[test]
    fn test_snapshot_filters_to_latest_year_in_input_order() {
        let market = Table::new(vec![
            record(2022, "S", 10.0, 1.0),
            record(2021, "N", 999.0, 99.0),
            record(2022, "NE", 30.0, 3.0),
            record(2020, "S", 1.0, 1.0),
        ]);

        let snapshot = regional_snapshot(&market).unwrap();
        let regions: Vec<&str> = snapshot.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["S", "NE"]);
        assert!(snapshot.iter().all(|r| r.year == 2022));
        assert_close(snapshot.rows()[1].capacity_share_pct, 75.0);
    }

    #[test]
    fn test_zero_totals_give_missing_shares() {
        let market = Table::new(vec![record(2021, "N", 0.0, 3.0), record(2021, "S", 0.0, 1.0)]);

        let snapshot = regional_snapshot(&market).unwrap();
        assert!(snapshot.iter().all(|r| r.capacity_share_pct.is_none()));
        assert_close(snapshot.rows()[0].value_share_pct, 75.0);
    }

    #[test]
    fn test_empty_market_snapshot_is_empty_input() {
        assert!(matches!(
            regional_snapshot(&Table::default()),
            Err(MarketError::EmptyInput)
        ));
    }

    #[test]
    fn test_ratio_helpers() {
        assert_eq!(growth_pct(0.0, 10.0), None);
        assert_eq!(growth_pct(0.0, 0.0), None);
        assert_close(growth_pct(10.0, 5.0), -50.0);
        assert_eq!(share_pct(1.0, 0.0), None);
        assert_close(share_pct(1.0, 4.0), 25.0);
    }
}
