mod accounts;
mod calculations;
mod db;
mod estimate;

use clap::{Parser, Subcommand};
use ratekit_core::{FormulaVersion, Platform};
use tracing_subscriber::EnvFilter;

use crate::{
    accounts::{AccountsCommands, SessionsCommands},
    db::DbCommands,
    estimate::InputArgs,
};

#[derive(Debug, Parser)]
#[command(name = "ratekit-cli")]
#[command(about = "Influencer rate estimates and calculation history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute an estimate locally without saving it
    Estimate {
        /// YouTube formula version
        #[arg(long, env = "RATEKIT_YOUTUBE_FORMULA", default_value = "v1")]
        formula: FormulaVersion,
        #[command(subcommand)]
        input: InputArgs,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage bearer sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommands,
    },
    /// Compute an estimate and save it to the session's history
    Save {
        /// Bearer session token
        #[arg(long, env = "RATEKIT_SESSION_TOKEN", hide_env_values = true)]
        token: String,
        /// Name for the saved calculation; defaults to the platform name
        #[arg(long)]
        name: Option<String>,
        #[command(subcommand)]
        input: InputArgs,
    },
    /// List saved calculations for the session's account
    History {
        /// Bearer session token
        #[arg(long, env = "RATEKIT_SESSION_TOKEN", hide_env_values = true)]
        token: String,
        /// Only show one platform
        #[arg(long)]
        platform: Option<Platform>,
        /// Maximum number of records to show
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Show oldest records first
        #[arg(long)]
        oldest_first: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("ratekit-cli ready; run with --help for commands");
        return Ok(());
    };

    match command {
        Commands::Estimate { formula, input } => estimate::run_estimate(input.into_input(), formula),
        Commands::Db { command } => db::run_db(command).await,
        Commands::Accounts { command } => accounts::run_accounts(command).await,
        Commands::Sessions { command } => accounts::run_sessions(command).await,
        Commands::Save { token, name, input } => {
            calculations::run_save(&token, name, input.into_input()).await
        }
        Commands::History {
            token,
            platform,
            limit,
            oldest_first,
        } => calculations::run_history(&token, platform, limit, oldest_first).await,
    }
}
