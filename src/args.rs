//! These structs provide the CLI interface for the budget CLI.

use crate::model::{Amount, OutcomeFilters, ProfileUpdate, SignUp};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: A command-line client for the BudgetPlanner expense tracker.
///
/// Sign in to your BudgetPlanner server, then record outcomes (expenses) under categories, keep
/// your balance up to date, and see where the money goes with `budget stats`.
///
/// Run `budget init --base-url <URL>` first. Setting BUDGET_IN_TEST_MODE to a non-empty value
/// runs every command against an in-memory server seeded with demo data; sign in there with
/// username `demo` and password `demo-password`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and write the configuration file.
    ///
    /// This is the first command you should run. Pass the address of your BudgetPlanner server
    /// as --base-url, e.g. http://localhost:8000/. The data directory defaults to $HOME/budget,
    /// use --budget-home to put it somewhere else.
    Init(InitArgs),
    /// Sign in and remember the access token for later commands.
    SignIn(SignInArgs),
    /// Register a new account. This does not sign you in.
    SignUp(SignUpArgs),
    /// Forget the saved access token.
    SignOut,
    /// Show or update your profile.
    Profile(ProfileArgs),
    /// List, add, show, rename or delete categories.
    Categories(CategoriesArgs),
    /// List, add, show, edit or delete outcomes (expenses).
    Outcomes(OutcomesArgs),
    /// Show or set your balance.
    Balance(BalanceArgs),
    /// Show each category's share of your spend, as chart slices.
    Stats,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration and the access token are held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The address of the BudgetPlanner server, e.g. https://budget.example.com/
    #[arg(long)]
    base_url: String,
}

impl InitArgs {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Args for the `budget sign-in` command.
#[derive(Debug, Parser, Clone)]
pub struct SignInArgs {
    #[arg(long)]
    username: String,

    /// Can also be given in BUDGET_PASSWORD to keep it out of your shell history.
    #[arg(long, env = "BUDGET_PASSWORD", hide_env_values = true)]
    password: String,
}

impl SignInArgs {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Args for the `budget sign-up` command.
#[derive(Debug, Parser, Clone)]
pub struct SignUpArgs {
    #[arg(long)]
    username: String,

    /// Must start with `+` followed by digits, e.g. +15550100
    #[arg(long)]
    phone_number: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "BUDGET_PASSWORD", hide_env_values = true)]
    password: String,
}

impl SignUpArgs {
    pub fn to_sign_up(&self) -> SignUp {
        SignUp {
            username: self.username.clone(),
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ProfileArgs {
    #[command(subcommand)]
    action: ProfileSubcommand,
}

impl ProfileArgs {
    pub fn action(&self) -> &ProfileSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileSubcommand {
    /// Show your profile.
    Show,
    /// Change one or more profile fields. Fields you leave out are not changed.
    Update(ProfileUpdateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
}

impl ProfileUpdateArgs {
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    action: CategoriesSubcommand,
}

impl CategoriesArgs {
    pub fn action(&self) -> &CategoriesSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesSubcommand {
    /// List all categories.
    List,
    /// Create a category.
    Add { name: String },
    /// Show one category.
    Show { id: i64 },
    /// Rename a category.
    Rename { id: i64, name: String },
    /// Delete a category. The server deletes the outcomes filed under it too.
    Delete { id: i64 },
}

#[derive(Debug, Parser, Clone)]
pub struct OutcomesArgs {
    #[command(subcommand)]
    action: OutcomesSubcommand,
}

impl OutcomesArgs {
    pub fn action(&self) -> &OutcomesSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OutcomesSubcommand {
    /// List outcomes, optionally filtered.
    List(OutcomeListArgs),
    /// Record an outcome. AMOUNT may be written like 12.50, $12.50 or $1,200.
    Add { amount: Amount, category_id: i64 },
    /// Show one outcome.
    Show { id: i64 },
    /// Change an outcome's amount and category.
    Edit {
        id: i64,
        amount: Amount,
        category_id: i64,
    },
    /// Delete an outcome.
    Delete { id: i64 },
}

/// Filters for `budget outcomes list`. Filters you leave out are not sent to the server.
#[derive(Debug, Default, Parser, Clone)]
pub struct OutcomeListArgs {
    /// Only outcomes of at least this amount.
    #[arg(long)]
    min_amount: Option<Amount>,

    /// Only outcomes of at most this amount.
    #[arg(long)]
    max_amount: Option<Amount>,

    /// Only outcomes whose creation time contains this text, e.g. 2025-10
    #[arg(long)]
    created_at: Option<String>,

    /// Only outcomes in this category.
    #[arg(long)]
    category_id: Option<i64>,
}

impl OutcomeListArgs {
    pub fn filters(&self) -> OutcomeFilters {
        OutcomeFilters {
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            created_at: self.created_at.clone(),
            category_id: self.category_id,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct BalanceArgs {
    #[command(subcommand)]
    action: BalanceSubcommand,
}

impl BalanceArgs {
    pub fn action(&self) -> &BalanceSubcommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BalanceSubcommand {
    /// Show your balance.
    Show,
    /// Replace your balance. It must not be negative.
    Set {
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
