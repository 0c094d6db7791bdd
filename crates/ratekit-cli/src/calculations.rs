//! Saving and listing calculations through the Postgres collaborator.

use ratekit_core::{HistoryOrder, HistoryQuery, MetricInput, NewCalculation, Platform, SessionToken};
use ratekit_db::PgCollaborator;
use ratekit_store::{CalculationRecordStore, HistoryReader};

use crate::db::connect;

async fn collaborator() -> anyhow::Result<(ratekit_core::AppConfig, PgCollaborator)> {
    let config = ratekit_core::load_app_config()?;
    let pool = connect(&config).await?;
    let collaborator = PgCollaborator::new(pool, config.token_hash_salt.clone());
    Ok((config, collaborator))
}

pub(crate) async fn run_save(
    token: &str,
    name: Option<String>,
    input: MetricInput,
) -> anyhow::Result<()> {
    let (config, collaborator) = collaborator().await?;
    let record = CalculationRecordStore::new(&collaborator, config.youtube_formula)
        .save(&SessionToken::new(token), NewCalculation { name, input })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "save failed"))?;

    println!("saved {} \"{}\"", record.id, record.name);
    println!("post value: {:.2}", record.result.post_value);
    if let Some(premium) = record.result.premium_value {
        println!("premium value: {premium:.2}");
    }
    Ok(())
}

pub(crate) async fn run_history(
    token: &str,
    platform: Option<Platform>,
    limit: u32,
    oldest_first: bool,
) -> anyhow::Result<()> {
    let (_, collaborator) = collaborator().await?;
    let query = HistoryQuery {
        platform,
        limit: Some(limit),
        order: if oldest_first {
            HistoryOrder::OldestFirst
        } else {
            HistoryOrder::NewestFirst
        },
    };
    let records = HistoryReader::new(&collaborator)
        .list(&SessionToken::new(token), &query)
        .await?;
    tracing::debug!(count = records.len(), limit, "history loaded");

    if records.is_empty() {
        println!("no saved calculations yet");
        return Ok(());
    }

    println!("{:<18}{:<11}{:>12}  NAME", "CREATED", "PLATFORM", "VALUE");
    for record in &records {
        println!(
            "{:<18}{:<11}{:>12.2}  {}",
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            record.platform.as_str(),
            record.result.post_value,
            record.name
        );
    }
    Ok(())
}
