use budget_planner::args::{
    Args, BalanceSubcommand, CategoriesSubcommand, Command, OutcomesSubcommand, ProfileSubcommand,
};
use budget_planner::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // This allows for running the program without a BudgetPlanner server. When
    // BUDGET_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    if let Command::Init(init_args) = args.command() {
        commands::init(home, init_args.base_url()).await?.print();
        return Ok(());
    }

    let config = Config::load(home).await?;
    let budget = commands::budget(&config, mode).await?;

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(_) => {}

        Command::SignIn(sign_in_args) => commands::sign_in(
            &config,
            &budget,
            sign_in_args.username(),
            sign_in_args.password(),
        )
        .await?
        .print(),

        Command::SignUp(sign_up_args) => commands::sign_up(&budget, &sign_up_args.to_sign_up())
            .await?
            .print(),

        Command::SignOut => commands::sign_out(&config, &budget).await?.print(),

        Command::Profile(profile_args) => match profile_args.action() {
            ProfileSubcommand::Show => commands::profile(&budget).await?.print(),
            ProfileSubcommand::Update(update_args) => {
                commands::update_profile(&budget, &update_args.to_update())
                    .await?
                    .print()
            }
        },

        Command::Categories(categories_args) => match categories_args.action() {
            CategoriesSubcommand::List => commands::categories_list(&budget).await?.print(),
            CategoriesSubcommand::Add { name } => {
                commands::categories_add(&budget, name).await?.print()
            }
            CategoriesSubcommand::Show { id } => {
                commands::categories_show(&budget, *id).await?.print()
            }
            CategoriesSubcommand::Rename { id, name } => {
                commands::categories_rename(&budget, *id, name)
                    .await?
                    .print()
            }
            CategoriesSubcommand::Delete { id } => {
                commands::categories_delete(&budget, *id).await?.print()
            }
        },

        Command::Outcomes(outcomes_args) => match outcomes_args.action() {
            OutcomesSubcommand::List(list_args) => {
                commands::outcomes_list(&budget, list_args.filters())
                    .await?
                    .print()
            }
            OutcomesSubcommand::Add {
                amount,
                category_id,
            } => commands::outcomes_add(&budget, *amount, *category_id)
                .await?
                .print(),
            OutcomesSubcommand::Show { id } => commands::outcomes_show(&budget, *id).await?.print(),
            OutcomesSubcommand::Edit {
                id,
                amount,
                category_id,
            } => commands::outcomes_edit(&budget, *id, *amount, *category_id)
                .await?
                .print(),
            OutcomesSubcommand::Delete { id } => {
                commands::outcomes_delete(&budget, *id).await?.print()
            }
        },

        Command::Balance(balance_args) => match balance_args.action() {
            BalanceSubcommand::Show => commands::balance_show(&budget).await?.print(),
            BalanceSubcommand::Set { amount } => {
                commands::balance_set(&budget, amount).await?.print()
            }
        },

        Command::Stats => commands::stats(&budget).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
