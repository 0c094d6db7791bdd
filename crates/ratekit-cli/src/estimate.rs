//! Metric input arguments shared by `estimate` and `save`, and the offline
//! estimate command.

use clap::Subcommand;
use ratekit_core::{
    AudienceScope, Breakdown, ContentCategory, FormulaVersion, InstagramMetrics, MetricInput,
    TikTokMetrics, YouTubeMetrics,
};

#[derive(Debug, Clone, Subcommand)]
pub enum InputArgs {
    /// Instagram post and reel
    Instagram {
        #[arg(long)]
        followers: u64,
        /// `small` or `large`
        #[arg(long, default_value = "small")]
        scope: AudienceScope,
        /// Minimum expected reach, percent of followers
        #[arg(long)]
        min_reach: f64,
        /// Maximum expected reach, percent of followers
        #[arg(long)]
        max_reach: f64,
        #[arg(long, default_value = "0")]
        engagement: f64,
        /// Days of usage rights granted
        #[arg(long, default_value = "1")]
        license_days: u32,
        #[arg(long)]
        discount: bool,
    },
    /// TikTok video
    Tiktok {
        #[arg(long)]
        followers: u64,
        #[arg(long)]
        views: u64,
        #[arg(long)]
        likes: u64,
        #[arg(long)]
        comments: u64,
        #[arg(long)]
        discount: bool,
    },
    /// YouTube integration
    Youtube {
        #[arg(long)]
        subscribers: u64,
        #[arg(long)]
        monthly_views: u64,
        #[arg(long)]
        engagement: f64,
        /// education, entertainment, gaming, lifestyle or other
        #[arg(long, default_value = "other")]
        category: ContentCategory,
    },
}

impl InputArgs {
    pub fn into_input(self) -> MetricInput {
        match self {
            InputArgs::Instagram {
                followers,
                scope,
                min_reach,
                max_reach,
                engagement,
                license_days,
                discount,
            } => MetricInput::Instagram(InstagramMetrics {
                follower_count: followers,
                audience_scope: scope,
                min_reach_pct: min_reach,
                max_reach_pct: max_reach,
                engagement_pct: engagement,
                license_days,
                discount_requested: discount,
            }),
            InputArgs::Tiktok {
                followers,
                views,
                likes,
                comments,
                discount,
            } => MetricInput::Tiktok(TikTokMetrics {
                follower_count: followers,
                view_count: views,
                like_count: likes,
                comment_count: comments,
                discount_requested: discount,
            }),
            InputArgs::Youtube {
                subscribers,
                monthly_views,
                engagement,
                category,
            } => MetricInput::Youtube(YouTubeMetrics {
                subscriber_count: subscribers,
                monthly_view_count: monthly_views,
                engagement_pct: engagement,
                content_category: category,
            }),
        }
    }
}

/// Validate, compute, and print an estimate with its breakdown.
///
/// # Errors
///
/// Returns an error if the input fails validation.
pub(crate) fn run_estimate(input: MetricInput, formula: FormulaVersion) -> anyhow::Result<()> {
    input.validate()?;
    let breakdown = Breakdown::of(&input, formula);
    let result = breakdown.to_result();

    println!("platform:      {}", input.platform());
    println!("post value:    {:.2}", result.post_value);
    if let Some(premium) = result.premium_value {
        println!("premium value: {premium:.2}");
    }
    println!("breakdown:");
    println!("{}", serde_json::to_string_pretty(&breakdown)?);
    Ok(())
}
