//! Turns the server's per-category statistics into slices a pie chart can draw.

use crate::model::OutcomeStatistic;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Slice colors, assigned in input order and repeated when there are more categories.
pub const PALETTE: [&str; 8] = [
    "#FF5733", "#33FF57", "#5733FF", "#FFD700", "#00BFFF", "#FF33A8", "#8E44AD", "#2ECC71",
];

/// The color of the placeholder slice drawn when there is no data.
pub const NEUTRAL: &str = "#999999";

pub const NO_DATA: &str = "No Data";

/// One slice of the spend chart.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ChartSlice {
    pub name: String,
    /// The category total. Never zero: a missing or zero total is drawn as `1` so the slice
    /// stays visible.
    pub value: Decimal,
    /// Percentage of all spend, rounded to two decimal places.
    pub share: Decimal,
    pub color: &'static str,
}

/// Maps statistics to chart slices. The output always has at least one slice.
pub fn aggregate(stats: &[OutcomeStatistic]) -> Vec<ChartSlice> {
    if stats.is_empty() {
        return vec![ChartSlice {
            name: NO_DATA.to_string(),
            value: Decimal::ONE,
            share: Decimal::new(0, 2),
            color: NEUTRAL,
        }];
    }
    stats
        .iter()
        .enumerate()
        .map(|(i, stat)| ChartSlice {
            name: stat.category_name.clone(),
            value: stat
                .total_amount
                .filter(|total| !total.is_zero())
                .unwrap_or(Decimal::ONE),
            share: stat
                .percentage
                .unwrap_or_default()
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}
