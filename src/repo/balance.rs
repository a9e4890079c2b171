use crate::api::{ApiClient, Method};
use crate::model::Amount;
use crate::repo::{decode, Invalidations, RepoError, RepoResult, Resource};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Deserialize)]
struct BalanceBody {
    balance: Amount,
}

/// Reads and overwrites the signed-in user's balance.
#[derive(Debug, Clone)]
pub struct BalanceService {
    client: ApiClient,
    invalidations: Invalidations,
}

impl BalanceService {
    pub fn new(client: ApiClient, invalidations: Invalidations) -> Self {
        Self {
            client,
            invalidations,
        }
    }

    pub async fn get(&self) -> RepoResult<Amount> {
        let value = self
            .client
            .request(Method::Get, "get-balance/", None)
            .await?;
        let body: BalanceBody = decode(value, "balance")?;
        Ok(body.balance)
    }

    /// Replaces the balance with `amount` and returns the balance the server now holds. A negative
    /// amount is rejected without contacting the server.
    ///
    /// The server only acknowledges the edit with a message, so the balance is read back
    /// afterwards unless the response already carries it. Once the server has accepted the edit,
    /// a failed read-back is logged and `amount` is returned as the confirmed balance.
    pub async fn set(&self, amount: Amount) -> RepoResult<Amount> {
        if amount.is_negative() {
            return Err(RepoError::InvalidInput(format!(
                "the balance must not be negative, got {amount}"
            )));
        }
        let value = self
            .client
            .request(Method::Post, "edit-balance/", Some(&json!({ "amount": amount })))
            .await?;
        self.invalidations.emit(&[Resource::Balance]);

        let confirmed: Amount = match value.get("balance") {
            Some(balance) if !balance.is_null() => decode(balance.clone(), "balance")?,
            _ => {
                if let Some(message) = value.get("message").and_then(Value::as_str) {
                    debug!("edit-balance: {message}");
                }
                match self.get().await {
                    Ok(balance) => balance,
                    Err(e) => {
                        warn!("Balance set to {amount} but reading it back failed: {e}");
                        amount
                    }
                }
            }
        };
        Ok(confirmed)
    }
}
