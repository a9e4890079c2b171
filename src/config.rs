//! Configuration file handling.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and holds the URL of the
//! BudgetPlanner server. `$BUDGET_HOME/.secrets/token.json` holds the access token between runs
//! once the user has signed in from the command line.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    base_url: Url,
}

impl Config {
    /// Creates the home directory and its `.secrets` subdirectory, then writes an initial
    /// `config.json` pointing at `base_url`.
    ///
    /// # Errors
    /// - Returns an error if `base_url` is not an http(s) URL.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, base_url: &str) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url: base_url.to_string(),
            token_path: None,
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            base_url,
        })
    }

    /// This will
    /// - validate that `budget_home` and its config file exist
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budget home directory is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'budget init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let base_url = parse_base_url(&config_file.base_url)?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Reads the saved access token, if there is one.
    pub async fn load_token(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.is_file() {
            return Ok(None);
        }
        let stored: StoredToken = utils::deserialize(&path).await?;
        Ok(Some(stored.access).filter(|t| !t.is_empty()))
    }

    pub async fn save_token(&self, access: &str) -> Result<()> {
        let stored = StoredToken {
            access: access.to_string(),
        };
        let data = serde_json::to_string_pretty(&stored).context("Unable to serialize token")?;
        utils::write(self.token_path(), data)
            .await
            .context("Unable to write the token file")
    }

    pub async fn clear_token(&self) -> Result<()> {
        utils::remove_file(&self.token_path()).await
    }
}

/// The on-disk form of the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access: String,
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "base_url": "https://budget.example.com/",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the BudgetPlanner server
    base_url: String,

    /// Path to the token file (optional, relative to the home directory or absolute)
    /// Defaults to $BUDGET_HOME/.secrets/token.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or has the wrong `app_name`.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Parses the server URL and makes sure it ends with `/` so that endpoint paths are joined onto
/// it rather than replacing its last segment.
fn parse_base_url(s: &str) -> Result<Url> {
    let mut url =
        Url::parse(s.trim()).with_context(|| format!("Invalid server URL '{s}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("The server URL must use http or https, got '{}'", url.scheme());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
