//! Competitor and customer breakdowns.

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{CompetitorPosition, CompetitorRecord, CustomerRecord, SegmentCount};
use crate::table_store::{Table, TableRow};

/// Installed capacity (MW) per unit of bubble size on the positioning chart.
const BUBBLE_SCALE_MW: f64 = 1000.0;

pub fn customer_type_distribution(customers: &Table<CustomerRecord>) -> Vec<SegmentCount> {
    count_by(customers.iter().map(|c| c.customer_type.as_str()))
}

pub fn size_category_distribution(customers: &Table<CustomerRecord>) -> Vec<SegmentCount> {
    count_by(customers.iter().map(|c| c.size_category.as_str()))
}

/// Share, strength and bubble size per company, in input order.
pub fn competitor_positions(competitors: &Table<CompetitorRecord>) -> Result<Vec<CompetitorPosition>> {
    competitors
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            c.validate(idx as u64 + 1)?;
            Ok(CompetitorPosition {
                company_name: c.company_name.clone(),
                market_share_percent: c.market_share_percent,
                strength_score: c.strength_score,
                bubble_size: c.installed_capacity_mw / BUBBLE_SCALE_MW,
            })
        })
        .collect()
}

/// Counts per category, largest first; equal counts keep first-seen order.
fn count_by<'a>(categories: impl Iterator<Item = &'a str>) -> Vec<SegmentCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<SegmentCount> = Vec::new();

    for category in categories {
        match index.get(category) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                index.insert(category, counts.len());
                counts.push(SegmentCount {
                    category: category.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
