//! Account and session administration.

use clap::Subcommand;
use ratekit_core::AccountRole;

use crate::db::connect;

#[derive(Debug, Subcommand)]
pub enum AccountsCommands {
    /// Create an account
    Create {
        #[arg(long)]
        email: String,
        /// Grant administrator access
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionsCommands {
    /// Issue a bearer token for an account and print it once
    Issue {
        #[arg(long)]
        email: String,
    },
}

pub(crate) async fn run_accounts(command: AccountsCommands) -> anyhow::Result<()> {
    let config = ratekit_core::load_app_config()?;
    let pool = connect(&config).await?;

    match command {
        AccountsCommands::Create { email, admin } => {
            let role = if admin {
                AccountRole::Admin
            } else {
                AccountRole::Member
            };
            let account = ratekit_db::create_account(&pool, &email, role).await?;
            println!("{}\t{}\t{}", account.id, account.email, account.role);
        }
    }
    Ok(())
}

pub(crate) async fn run_sessions(command: SessionsCommands) -> anyhow::Result<()> {
    let config = ratekit_core::load_app_config()?;
    let pool = connect(&config).await?;

    match command {
        SessionsCommands::Issue { email } => {
            let account = ratekit_db::get_account_by_email(&pool, &email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("account '{email}' not found"))?;
            let ttl = chrono::Duration::hours(i64::from(config.session_ttl_hours));
            tracing::debug!(%email, ttl_hours = config.session_ttl_hours, "issuing session");
            let session =
                ratekit_db::issue_session(&pool, &config.token_hash_salt, account.id, ttl).await?;
            eprintln!("expires at {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
            println!("{}", session.token.as_str());
        }
    }
    Ok(())
}
