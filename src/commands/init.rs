use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its `.secrets` subdirectory and an initial `config.json` that
/// points at `base_url`.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of data directory, e.g. `$HOME/budget`
/// - `base_url` - The address of the BudgetPlanner server, e.g. `https://budget.example.com/`
///
/// # Errors
/// - Returns an error if `base_url` is not an http(s) URL.
/// - Returns an error if any file operations fail.
pub async fn init(budget_home: &Path, base_url: &str) -> Result<Out<()>> {
    let config = Config::create(budget_home, base_url)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the budget directory at {} for server {}",
        config.root().display(),
        config.base_url()
    )
    .into())
}
