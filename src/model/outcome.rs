use crate::model::amount::optional_decimal;
use crate::model::Amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A single expense record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: i64,
    pub amount: Amount,
    pub category: CategoryRef,
    /// Absent in the body the server returns from `add-outcome/`.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The category an outcome is filed under. List and edit responses carry only the id; the
/// single-outcome response nests the whole category.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct CategoryRef {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CategoryRef {
    pub fn id(id: i64) -> Self {
        Self { id, name: None }
    }
}

impl<'de> Deserialize<'de> for CategoryRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Nested {
            id: i64,
            #[serde(default)]
            name: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(i64),
            Nested(Nested),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => CategoryRef::id(id),
            Raw::Nested(n) => CategoryRef {
                id: n.id,
                name: n.name,
            },
        })
    }
}

/// The result of creating an outcome. The server debits the balance when an outcome is saved and
/// reports the new balance alongside the outcome.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CreatedOutcome {
    pub outcome: Outcome,
    pub balance: Option<Decimal>,
}

impl<'de> Deserialize<'de> for CreatedOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped {
            outcome: Outcome,
            #[serde(default, deserialize_with = "optional_decimal")]
            balance: Option<Decimal>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Wrapped(Wrapped),
            Bare(Outcome),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Wrapped(w) => CreatedOutcome {
                outcome: w.outcome,
                balance: w.balance,
            },
            Raw::Bare(outcome) => CreatedOutcome {
                outcome,
                balance: None,
            },
        })
    }
}

/// Optional filters for listing outcomes. Unset filters are left out of the query string
/// entirely; they are never sent as empty values.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutcomeFilters {
    /// Only outcomes with an amount greater than or equal to this.
    pub min_amount: Option<Amount>,
    /// Only outcomes with an amount less than or equal to this.
    pub max_amount: Option<Amount>,
    /// Matched by the server as a substring of the creation timestamp, e.g. `2024-05`.
    pub created_at: Option<String>,
    pub category_id: Option<i64>,
}

impl OutcomeFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_amount(mut self, amount: Amount) -> Self {
        self.min_amount = Some(amount);
        self
    }

    pub fn max_amount(mut self, amount: Amount) -> Self {
        self.max_amount = Some(amount);
        self
    }

    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// The query parameters for `list-outcomes/`, using the server's names.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(min) = self.min_amount {
            query.push(("min_price".to_string(), min.value().to_string()));
        }
        if let Some(max) = self.max_amount {
            query.push(("max_price".to_string(), max.value().to_string()));
        }
        if let Some(created_at) = self.created_at.as_deref().map(str::trim) {
            if !created_at.is_empty() {
                query.push(("created_at".to_string(), created_at.to_string()));
            }
        }
        if let Some(category_id) = self.category_id {
            query.push(("category_id".to_string(), category_id.to_string()));
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}
