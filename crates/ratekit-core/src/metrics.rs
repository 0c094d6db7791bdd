//! Platform metric inputs and their validation.
//!
//! [`MetricInput`] is a tagged union keyed by `platform`; each variant carries
//! the strongly typed fields its formula needs. Counts are unsigned, so a
//! negative count never deserializes. Everything else that can be out of
//! range is checked by [`MetricInput::validate`] before the engine sees it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field-level validation failure, surfaced to callers next to the input
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::Tiktok, Platform::Youtube];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    /// Name given to a saved calculation when the user leaves it blank.
    #[must_use]
    pub fn default_record_name(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram Calculation",
            Platform::Tiktok => "TikTok Calculation",
            Platform::Youtube => "YouTube Calculation",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            other => Err(ValidationError::new(
                "platform",
                format!("must be instagram, tiktok, or youtube, got '{other}'"),
            )),
        }
    }
}

/// Audience size bucket; drives the Instagram per-follower rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceScope {
    Small,
    Large,
}

impl FromStr for AudienceScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(AudienceScope::Small),
            "large" => Ok(AudienceScope::Large),
            other => Err(ValidationError::new(
                "audience_scope",
                format!("must be small or large, got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Education,
    Entertainment,
    Gaming,
    Lifestyle,
    Other,
}

impl ContentCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Education => "education",
            ContentCategory::Entertainment => "entertainment",
            ContentCategory::Gaming => "gaming",
            ContentCategory::Lifestyle => "lifestyle",
            ContentCategory::Other => "other",
        }
    }
}

impl FromStr for ContentCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "education" => Ok(ContentCategory::Education),
            "entertainment" => Ok(ContentCategory::Entertainment),
            "gaming" => Ok(ContentCategory::Gaming),
            "lifestyle" => Ok(ContentCategory::Lifestyle),
            "other" => Ok(ContentCategory::Other),
            other => Err(ValidationError::new(
                "content_category",
                format!(
                    "must be education, entertainment, gaming, lifestyle, or other, got '{other}'"
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramMetrics {
    pub follower_count: u64,
    pub audience_scope: AudienceScope,
    /// Lower bound of expected reach, as a percentage of followers.
    pub min_reach_pct: f64,
    /// Upper bound of expected reach, as a percentage of followers.
    pub max_reach_pct: f64,
    /// Collected for display; the Instagram formula does not price it.
    pub engagement_pct: f64,
    /// Days of usage rights granted to the brand.
    pub license_days: u32,
    #[serde(default)]
    pub discount_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TikTokMetrics {
    pub follower_count: u64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(default)]
    pub discount_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouTubeMetrics {
    pub subscriber_count: u64,
    pub monthly_view_count: u64,
    pub engagement_pct: f64,
    pub content_category: ContentCategory,
}

/// The metrics a user supplies for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum MetricInput {
    Instagram(InstagramMetrics),
    Tiktok(TikTokMetrics),
    Youtube(YouTubeMetrics),
}

impl MetricInput {
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            MetricInput::Instagram(_) => Platform::Instagram,
            MetricInput::Tiktok(_) => Platform::Tiktok,
            MetricInput::Youtube(_) => Platform::Youtube,
        }
    }

    /// Check every range constraint the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            MetricInput::Instagram(m) => {
                check_percentage("min_reach_pct", m.min_reach_pct)?;
                check_percentage("max_reach_pct", m.max_reach_pct)?;
                check_non_negative("engagement_pct", m.engagement_pct)?;
                if m.license_days == 0 {
                    return Err(ValidationError::new(
                        "license_days",
                        "must be a positive number of days",
                    ));
                }
                Ok(())
            }
            // All TikTok fields are unsigned counts or booleans.
            MetricInput::Tiktok(_) => Ok(()),
            MetricInput::Youtube(m) => check_percentage("engagement_pct", m.engagement_pct),
        }
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a number"))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

fn check_percentage(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be between 0 and 100, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instagram() -> InstagramMetrics {
        InstagramMetrics {
            follower_count: 10_000,
            audience_scope: AudienceScope::Small,
            min_reach_pct: 5.0,
            max_reach_pct: 50.0,
            engagement_pct: 3.0,
            license_days: 1,
            discount_requested: false,
        }
    }

    #[test]
    fn valid_instagram_input_passes() {
        assert!(MetricInput::Instagram(instagram()).validate().is_ok());
    }

    #[test]
    fn reach_above_100_is_rejected() {
        let mut m = instagram();
        m.max_reach_pct = 120.0;
        let err = MetricInput::Instagram(m).validate().unwrap_err();
        assert_eq!(err.field, "max_reach_pct");
        assert!(err.message.contains("between 0 and 100"));
    }

    #[test]
    fn negative_reach_is_rejected() {
        let mut m = instagram();
        m.min_reach_pct = -1.0;
        let err = MetricInput::Instagram(m).validate().unwrap_err();
        assert_eq!(err.field, "min_reach_pct");
    }

    #[test]
    fn instagram_engagement_may_exceed_100() {
        let mut m = instagram();
        m.engagement_pct = 140.0;
        assert!(MetricInput::Instagram(m).validate().is_ok());
    }

    #[test]
    fn zero_license_days_is_rejected() {
        let mut m = instagram();
        m.license_days = 0;
        let err = MetricInput::Instagram(m).validate().unwrap_err();
        assert_eq!(err.field, "license_days");
    }

    #[test]
    fn nan_is_rejected() {
        let input = MetricInput::Youtube(YouTubeMetrics {
            subscriber_count: 1,
            monthly_view_count: 1,
            engagement_pct: f64::NAN,
            content_category: ContentCategory::Other,
        });
        let err = input.validate().unwrap_err();
        assert_eq!(err.field, "engagement_pct");
        assert_eq!(err.message, "must be a number");
    }

    #[test]
    fn youtube_engagement_above_100_is_rejected() {
        let input = MetricInput::Youtube(YouTubeMetrics {
            subscriber_count: 1,
            monthly_view_count: 1,
            engagement_pct: 101.0,
            content_category: ContentCategory::Gaming,
        });
        assert!(input.validate().is_err());
    }

    #[test]
    fn metric_input_is_tagged_by_platform() {
        let json = serde_json::json!({
            "platform": "tiktok",
            "follower_count": 10,
            "view_count": 20,
            "like_count": 3,
            "comment_count": 1
        });
        let input: MetricInput = serde_json::from_value(json).expect("deserialize");
        assert_eq!(input.platform(), Platform::Tiktok);
        let MetricInput::Tiktok(m) = input else {
            panic!("expected tiktok variant");
        };
        assert!(!m.discount_requested);
    }

    #[test]
    fn negative_count_fails_to_deserialize() {
        let json = serde_json::json!({
            "platform": "tiktok",
            "follower_count": -5,
            "view_count": 20,
            "like_count": 3,
            "comment_count": 1
        });
        assert!(serde_json::from_value::<MetricInput>(json).is_err());
    }

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn default_record_names() {
        assert_eq!(
            Platform::Instagram.default_record_name(),
            "Instagram Calculation"
        );
        assert_eq!(Platform::Tiktok.default_record_name(), "TikTok Calculation");
        assert_eq!(Platform::Youtube.default_record_name(), "YouTube Calculation");
    }
}
