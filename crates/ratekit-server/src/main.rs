mod api;
mod middleware;

use std::{sync::Arc, time::Duration};

use ratekit_store::Collaborator;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, HistoryLimits},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ratekit_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = ratekit_db::PoolConfig::from_app_config(&config);
    let pool = ratekit_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = ratekit_db::run_migrations(&pool).await?;
    tracing::info!(applied, env = %config.env, "database ready");

    let collaborator: Arc<dyn Collaborator> = Arc::new(ratekit_db::PgCollaborator::new(
        pool,
        config.token_hash_salt.clone(),
    ));
    let state = AppState {
        collaborator,
        youtube_formula: config.youtube_formula,
        history: HistoryLimits {
            default_limit: config.history_default_limit,
            max_limit: config.history_max_limit,
        },
    };
    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );
    let app = build_app(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
