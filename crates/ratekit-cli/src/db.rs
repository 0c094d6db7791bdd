use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

/// Connect a pool using the loaded application config.
pub(crate) async fn connect(
    config: &ratekit_core::AppConfig,
) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = ratekit_db::PoolConfig::from_app_config(config);
    Ok(ratekit_db::connect_pool(&config.database_url, pool_config).await?)
}

pub(crate) async fn run_db(command: DbCommands) -> anyhow::Result<()> {
    let config = ratekit_core::load_app_config()?;
    let pool = connect(&config).await?;

    match command {
        DbCommands::Ping => {
            ratekit_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = ratekit_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
        }
    }

    pool.close().await;
    Ok(())
}
