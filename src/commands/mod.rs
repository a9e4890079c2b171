//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands. Handlers take a `Budget` rather
//! than building one, so tests can run them against an in-memory server.

mod account;
mod balance;
mod categories;
mod init;
mod outcomes;
mod stats;

use crate::api::{self, Mode};
use crate::repo::{Budget, RepoError, RepoResult};
use crate::session::SessionStore;
use crate::{Config, Result};
use anyhow::anyhow;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use account::{profile, sign_in, sign_out, sign_up, update_profile};
pub use balance::{balance_set, balance_show};
pub use categories::{
    categories_add, categories_delete, categories_list, categories_rename, categories_show,
};
pub use init::init;
pub use outcomes::{outcomes_add, outcomes_delete, outcomes_edit, outcomes_list, outcomes_show};
pub use stats::stats;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Puts `line` above the current message.
    pub(crate) fn prepend(mut self, line: impl AsRef<str>) -> Self {
        self.message = format!("{}\n{}", line.as_ref(), self.message);
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `info!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                info!("\n{json}");
            }
        }
    }
}

/// Builds the repositories for a command, seeding the session with the token saved by
/// `budget sign-in`, if any.
pub async fn budget(config: &Config, mode: Mode) -> Result<Budget> {
    let session = match config.load_token().await? {
        Some(token) => SessionStore::with_token(token),
        None => {
            debug!("No saved token at {}", config.token_path().display());
            SessionStore::new()
        }
    };
    let client = api::client(config, session, mode)?;
    Ok(Budget::new(client))
}

/// Converts a repository failure into a command error that tells the user what to do next.
pub(crate) trait ReportRepoError<T> {
    fn or_report(self, action: &str) -> Result<T>;
}

impl<T> ReportRepoError<T> for RepoResult<T> {
    fn or_report(self, action: &str) -> Result<T> {
        self.map_err(|e| match e {
            RepoError::Unauthenticated => anyhow!(
                "Unable to {action}: you are not signed in or your session has expired, run \
                'budget sign-in'"
            ),
            other => anyhow::Error::new(other).context(format!("Unable to {action}")),
        })
    }
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    format!("{count} {noun}{}", if count == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }

    #[test]
    fn test_unauthenticated_report() {
        let result: RepoResult<()> = Err(RepoError::Unauthenticated);
        let err = result.or_report("list categories").unwrap_err();
        assert!(err.to_string().contains("budget sign-in"));

        let result: RepoResult<()> = Err(RepoError::NotFound);
        let err = result.or_report("show category 9").unwrap_err();
        assert_eq!(err.to_string(), "Unable to show category 9");
        assert_eq!(err.root_cause().to_string(), "the requested item does not exist");
    }

    #[tokio::test]
    async fn test_budget_uses_saved_token() {
        let env = TestEnv::signed_out().await;
        let config = env.config();
        let budget = budget(&config, Mode::Test).await.unwrap();
        assert!(!budget.client().session().is_authenticated());

        config.save_token("test-access-demo").await.unwrap();
        let budget = super::budget(&config, Mode::Test).await.unwrap();
        let categories = budget.categories().list().await.unwrap();
        assert_eq!(categories.len(), 3);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "outcome"), "1 outcome");
        assert_eq!(plural(0, "outcome"), "0 outcomes");
    }
}
