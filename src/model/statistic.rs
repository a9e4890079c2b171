use crate::model::amount::optional_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-category spend as computed by the server: the category's total and its share of all
/// outcomes as a percentage. Categories without outcomes come back with a `null` total.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStatistic {
    #[serde(default)]
    pub category_id: Option<i64>,
    pub category_name: String,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub total_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_decimal")]
    pub percentage: Option<Decimal>,
}

impl OutcomeStatistic {
    pub fn new(
        category_name: impl Into<String>,
        total_amount: Option<Decimal>,
        percentage: Option<Decimal>,
    ) -> Self {
        Self {
            category_id: None,
            category_name: category_name.into(),
            total_amount,
            percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deserialize_server_shape() {
        let stats: Vec<OutcomeStatistic> = serde_json::from_str(
            r#"[
                {"category_id": 1, "category_name": "Food", "total_amount": "30.00",
                 "percentage": 75.0},
                {"category_id": 2, "category_name": "Rent", "total_amount": null,
                 "percentage": 0}
            ]"#,
        )
        .unwrap();
        assert_eq!(stats[0].total_amount, Some(Decimal::from_str("30.00").unwrap()));
        assert_eq!(stats[0].percentage, Some(Decimal::from(75)));
        assert_eq!(stats[1].total_amount, None);
        assert_eq!(stats[1].percentage, Some(Decimal::ZERO));
    }
}
