use crate::api::{ApiClient, Method};
use crate::model::{Amount, CreatedOutcome, Outcome, OutcomeFilters, OutcomeStatistic};
use crate::repo::{decode, Invalidations, RepoError, RepoResult, Resource};
use serde_json::json;
use tracing::debug;

/// Saving, editing or deleting an outcome changes the outcome list, the per-category statistics
/// and, because the server debits the balance, the balance.
const OUTCOME_MUTATION: &[Resource] = &[
    Resource::Outcomes,
    Resource::Statistics,
    Resource::Balance,
];

/// Create, read, update and delete for the signed-in user's outcomes, plus the per-category
/// statistics the server computes over them.
#[derive(Debug, Clone)]
pub struct OutcomeRepository {
    client: ApiClient,
    invalidations: Invalidations,
}

impl OutcomeRepository {
    pub fn new(client: ApiClient, invalidations: Invalidations) -> Self {
        Self {
            client,
            invalidations,
        }
    }

    /// Lists outcomes. Filters that are not set are not sent.
    pub async fn list(&self, filters: &OutcomeFilters) -> RepoResult<Vec<Outcome>> {
        let value = self
            .client
            .request_with_query(Method::Get, "list-outcomes/", filters.to_query(), None)
            .await?;
        decode(value, "outcome list")
    }

    /// Per-category totals and shares, one entry per category.
    pub async fn list_with_statistics(&self) -> RepoResult<Vec<OutcomeStatistic>> {
        let value = self
            .client
            .request(Method::Get, "list-outcomes-with-statistics/", None)
            .await?;
        decode(value, "statistics")
    }

    /// Fetches one outcome. The server nests the category, so `category.name` is filled in.
    pub async fn get(&self, id: i64) -> RepoResult<Outcome> {
        let value = self
            .client
            .request(Method::Get, &format!("get-outcome/{id}/"), None)
            .await?;
        decode(value, "outcome")
    }

    /// Records an expense. Both values are required and the amount must be greater than zero;
    /// otherwise nothing is sent.
    pub async fn create(
        &self,
        amount: Option<Amount>,
        category_id: Option<i64>,
    ) -> RepoResult<CreatedOutcome> {
        let amount = amount.ok_or(RepoError::MissingField("amount"))?;
        let category_id = category_id.ok_or(RepoError::MissingField("category"))?;
        check_positive(amount)?;

        let body = json!({ "amount": amount, "category": category_id });
        let value = self
            .client
            .request(Method::Post, "add-outcome/", Some(&body))
            .await?;
        let created: CreatedOutcome = decode(value, "created outcome")?;
        debug!(
            "Created outcome {} of {} in category {}",
            created.outcome.id, created.outcome.amount, created.outcome.category.id
        );
        self.invalidations.emit(OUTCOME_MUTATION);
        Ok(created)
    }

    /// Changes an outcome's amount and category. Like `create`, both values are required and
    /// checked before anything is sent.
    pub async fn update(
        &self,
        id: i64,
        amount: Option<Amount>,
        category_id: Option<i64>,
    ) -> RepoResult<Outcome> {
        let amount = amount.ok_or(RepoError::MissingField("amount"))?;
        let category_id = category_id.ok_or(RepoError::MissingField("category"))?;
        check_positive(amount)?;

        // The edit view reads `category`; `category_id` is kept for servers that expect it.
        let body = json!({
            "amount": amount,
            "category": category_id,
            "category_id": category_id,
        });
        let value = self
            .client
            .request(Method::Patch, &format!("edit-outcome/{id}/"), Some(&body))
            .await?;
        let outcome: Outcome = decode(value, "updated outcome")?;
        self.invalidations.emit(OUTCOME_MUTATION);
        Ok(outcome)
    }

    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        self.client
            .request(Method::Delete, &format!("delete-outcome/{id}/"), None)
            .await?;
        self.invalidations.emit(OUTCOME_MUTATION);
        Ok(())
    }
}

fn check_positive(amount: Amount) -> RepoResult<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(RepoError::InvalidInput(format!(
            "the amount must be greater than zero, got {amount}"
        )))
    }
}
