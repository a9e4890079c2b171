//! Repositories over the server's resources. Each repository call either returns normalized
//! entities or a `RepoError`; transport failures never escape as anything else.
//!
//! After a successful mutation a repository announces which `Resource`s went stale on the
//! `Invalidations` bus. List views subscribe to it and reload from the server instead of patching
//! their local copies.

mod account;
mod balance;
mod categories;
mod outcomes;

use crate::api::{ApiClient, ApiError};
use crate::error::FieldErrors;
use crate::model::AmountError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

pub use account::AccountService;
pub use balance::BalanceService;
pub use categories::CategoryRepository;
pub use outcomes::OutcomeRepository;

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// How many invalidation events a slow subscriber may fall behind before it is told it lagged.
const INVALIDATION_CAPACITY: usize = 64;

/// The domain-level classification of a failed repository call.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RepoError {
    /// The server rejected the input. The field association of each message is kept.
    #[error("{0}")]
    ValidationFailed(FieldErrors),
    /// The server rejected the credentials or the token. The caller should return the user to
    /// the sign-in flow.
    #[error("authentication failed or the session is no longer valid")]
    Unauthenticated,
    /// The referenced id does not exist (any more).
    #[error("the requested item does not exist")]
    NotFound,
    /// A required value was not supplied, so no request was sent.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// A value was supplied but is unusable, so no request was sent.
    #[error("{0}")]
    InvalidInput(String),
    /// A network failure, a server failure, or a response that could not be understood. The
    /// operation should be considered not applied.
    #[error("{0}")]
    Unexpected(String),
}

impl RepoError {
    /// Field-level messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            RepoError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ApiError> for RepoError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Validation(errors) => RepoError::ValidationFailed(errors),
            ApiError::Unauthorized => RepoError::Unauthenticated,
            ApiError::NotFound => RepoError::NotFound,
            ApiError::Server(detail) => RepoError::Unexpected(detail),
            ApiError::Transport(detail) => RepoError::Unexpected(detail),
        }
    }
}

impl From<AmountError> for RepoError {
    fn from(e: AmountError) -> Self {
        match e {
            AmountError::Empty => RepoError::MissingField("amount"),
            other => RepoError::InvalidInput(other.to_string()),
        }
    }
}

/// Decodes a successful response body into `T`. A body of the wrong shape is `Unexpected`.
pub(crate) fn decode<T>(value: Value, what: &str) -> RepoResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value)
        .map_err(|e| RepoError::Unexpected(format!("Unable to read the {what} response: {e}")))
}

/// Something a view may have cached that a mutation made stale.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Categories,
    Outcomes,
    Statistics,
    Balance,
    Profile,
}

serde_plain::derive_display_from_serialize!(Resource);
serde_plain::derive_fromstr_from_deserialize!(Resource);

/// A broadcast bus of `Resource` invalidations. Sending never fails a mutation: with no
/// subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct Invalidations {
    sender: broadcast::Sender<Resource>,
}

impl Default for Invalidations {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(INVALIDATION_CAPACITY);
        Self { sender }
    }
}

impl Invalidations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Resource> {
        self.sender.subscribe()
    }

    pub(crate) fn emit(&self, resources: &[Resource]) {
        for resource in resources {
            debug!("invalidating {resource}");
            let _ = self.sender.send(*resource);
        }
    }
}

/// All repositories, sharing one `ApiClient` and one `Invalidations` bus.
#[derive(Debug, Clone)]
pub struct Budget {
    client: ApiClient,
    invalidations: Invalidations,
}

impl Budget {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            invalidations: Invalidations::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn invalidations(&self) -> &Invalidations {
        &self.invalidations
    }

    pub fn account(&self) -> AccountService {
        AccountService::new(self.client.clone(), self.invalidations.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.client.clone(), self.invalidations.clone())
    }

    pub fn outcomes(&self) -> OutcomeRepository {
        OutcomeRepository::new(self.client.clone(), self.invalidations.clone())
    }

    pub fn balance(&self) -> BalanceService {
        BalanceService::new(self.client.clone(), self.invalidations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_mapping() {
        let errors: FieldErrors = [("amount", vec!["must be positive"])].into_iter().collect();
        assert_eq!(
            RepoError::from(ApiError::Validation(errors.clone())),
            RepoError::ValidationFailed(errors)
        );
        assert_eq!(
            RepoError::from(ApiError::Unauthorized),
            RepoError::Unauthenticated
        );
        assert_eq!(RepoError::from(ApiError::NotFound), RepoError::NotFound);
        assert!(matches!(
            RepoError::from(ApiError::Transport("down".to_string())),
            RepoError::Unexpected(_)
        ));
    }

    #[test]
    fn test_amount_error_mapping() {
        assert_eq!(
            RepoError::from(AmountError::Empty),
            RepoError::MissingField("amount")
        );
        assert!(matches!(
            RepoError::from(AmountError::Invalid("x".to_string())),
            RepoError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode::<Vec<i64>>(serde_json::json!({"a": 1}), "list").unwrap_err();
        assert!(matches!(err, RepoError::Unexpected(_)));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_fine() {
        let bus = Invalidations::new();
        bus.emit(&[Resource::Balance]);
        let mut rx = bus.subscribe();
        bus.emit(&[Resource::Categories, Resource::Statistics]);
        assert_eq!(rx.recv().await.unwrap(), Resource::Categories);
        assert_eq!(rx.recv().await.unwrap(), Resource::Statistics);
    }

    #[test]
    fn test_resource_display() {
        assert_eq!(Resource::Statistics.to_string(), "statistics");
        assert_eq!("balance".parse::<Resource>().unwrap(), Resource::Balance);
    }
}
