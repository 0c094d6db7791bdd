pub mod app_config;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod records;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use engine::{
    estimate, instagram_breakdown, round_currency, tiktok_breakdown, youtube_breakdown,
    Breakdown, EstimateResult, FormulaVersion, InstagramBreakdown, TikTokBreakdown,
    YouTubeBreakdown,
};
pub use metrics::{
    AudienceScope, ContentCategory, InstagramMetrics, MetricInput, Platform, TikTokMetrics,
    ValidationError, YouTubeMetrics,
};
pub use records::{
    resolve_record_name, Account, AccountRole, CalculationLogEntry, CalculationRecord,
    HistoryOrder, HistoryQuery, NewCalculation, SessionToken, MAX_RECORD_NAME_LEN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
