//! Persisted calculation shapes, accounts, and history queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{estimate, EstimateResult, FormulaVersion};
use crate::metrics::{MetricInput, Platform, ValidationError};

pub const MAX_RECORD_NAME_LEN: usize = 200;

/// Opaque bearer token identifying a logged-in session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Member,
    Admin,
}

impl AccountRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccountRole::Member => "member",
            AccountRole::Admin => "admin",
        }
    }
}

/// The account a session resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub role: AccountRole,
}

impl Account {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    /// Owners and administrators may read or delete a record.
    #[must_use]
    pub fn can_access(&self, owner: Uuid) -> bool {
        self.is_admin() || self.id == owner
    }
}

/// A save request: the metrics plus an optional human-assigned name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalculation {
    #[serde(default)]
    pub name: Option<String>,
    pub input: MetricInput,
}

/// Resolve the stored name for a calculation.
///
/// Blank or missing names fall back to the platform placeholder.
///
/// # Errors
///
/// Returns a [`ValidationError`] on `name` when it exceeds
/// [`MAX_RECORD_NAME_LEN`] characters after trimming.
pub fn resolve_record_name(
    platform: Platform,
    name: Option<&str>,
) -> Result<String, ValidationError> {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(platform.default_record_name().to_string());
    }
    if trimmed.chars().count() > MAX_RECORD_NAME_LEN {
        return Err(ValidationError::new(
            "name",
            format!("must be at most {MAX_RECORD_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// An immutable snapshot of one saved estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub platform: Platform,
    pub name: String,
    pub formula_version: FormulaVersion,
    pub input: MetricInput,
    pub result: EstimateResult,
    pub created_at: DateTime<Utc>,
}

impl CalculationRecord {
    /// Recompute the estimate from the stored input and check it against the
    /// stored result, allowing one cent of rounding drift.
    #[must_use]
    pub fn reproduces(&self) -> bool {
        estimate(&self.input, self.formula_version).matches_within_cent(&self.result)
    }
}

/// One row of the flat `calculations` log.
///
/// Only the columns that apply to the platform are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub platform: Platform,
    pub followers: Option<i64>,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub subscribers: Option<i64>,
    pub engagement: Option<f64>,
    pub content_type: Option<String>,
    pub has_discount: bool,
    pub estimated_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CalculationLogEntry {
    /// Flatten `input` and its estimate into a log row owned by `user_id`.
    #[must_use]
    pub fn from_estimate(user_id: Uuid, input: &MetricInput, result: &EstimateResult) -> Self {
        let mut entry = Self {
            id: None,
            user_id,
            platform: input.platform(),
            followers: None,
            views: None,
            likes: None,
            comments: None,
            subscribers: None,
            engagement: None,
            content_type: None,
            has_discount: false,
            estimated_value: result.post_value,
            created_at: None,
        };

        match input {
            MetricInput::Instagram(m) => {
                entry.followers = Some(saturating_i64(m.follower_count));
                entry.engagement = Some(m.engagement_pct);
                entry.has_discount = m.discount_requested;
            }
            MetricInput::Tiktok(m) => {
                entry.followers = Some(saturating_i64(m.follower_count));
                entry.views = Some(saturating_i64(m.view_count));
                entry.likes = Some(saturating_i64(m.like_count));
                entry.comments = Some(saturating_i64(m.comment_count));
                entry.has_discount = m.discount_requested;
            }
            MetricInput::Youtube(m) => {
                entry.subscribers = Some(saturating_i64(m.subscriber_count));
                entry.views = Some(saturating_i64(m.monthly_view_count));
                entry.engagement = Some(m.engagement_pct);
                entry.content_type = Some(m.content_category.as_str().to_string());
            }
        }

        entry
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filters for reading saved calculations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub platform: Option<Platform>,
    pub limit: Option<u32>,
    pub order: HistoryOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{
        AudienceScope, ContentCategory, InstagramMetrics, TikTokMetrics, YouTubeMetrics,
    };

    fn instagram_input() -> MetricInput {
        MetricInput::Instagram(InstagramMetrics {
            follower_count: 10_000,
            audience_scope: AudienceScope::Small,
            min_reach_pct: 5.0,
            max_reach_pct: 5.0,
            engagement_pct: 3.0,
            license_days: 1,
            discount_requested: false,
        })
    }

    #[test]
    fn blank_name_falls_back_to_placeholder() {
        assert_eq!(
            resolve_record_name(Platform::Tiktok, Some("   ")).unwrap(),
            "TikTok Calculation"
        );
        assert_eq!(
            resolve_record_name(Platform::Youtube, None).unwrap(),
            "YouTube Calculation"
        );
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(
            resolve_record_name(Platform::Instagram, Some("  Spring launch ")).unwrap(),
            "Spring launch"
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let long = "x".repeat(MAX_RECORD_NAME_LEN + 1);
        let err = resolve_record_name(Platform::Instagram, Some(long.as_str())).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn stored_record_reproduces_its_result() {
        let input = instagram_input();
        let record = CalculationRecord {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            platform: Platform::Instagram,
            name: "Instagram Calculation".to_string(),
            formula_version: FormulaVersion::V1,
            result: estimate(&input, FormulaVersion::V1),
            input,
            created_at: Utc::now(),
        };
        assert!(record.reproduces());

        let mut tampered = record.clone();
        tampered.result.post_value += 1.0;
        assert!(!tampered.reproduces());
    }

    #[test]
    fn log_entry_for_tiktok_populates_counts() {
        let input = MetricInput::Tiktok(TikTokMetrics {
            follower_count: 10_000,
            view_count: 50_000,
            like_count: 5_000,
            comment_count: 500,
            discount_requested: true,
        });
        let result = estimate(&input, FormulaVersion::V1);
        let user = Uuid::new_v4();
        let entry = CalculationLogEntry::from_estimate(user, &input, &result);
        assert_eq!(entry.user_id, user);
        assert_eq!(entry.platform, Platform::Tiktok);
        assert_eq!(entry.followers, Some(10_000));
        assert_eq!(entry.views, Some(50_000));
        assert_eq!(entry.comments, Some(500));
        assert!(entry.subscribers.is_none());
        assert!(entry.has_discount);
        assert_eq!(entry.estimated_value, result.post_value);
    }

    #[test]
    fn log_entry_for_youtube_records_content_type() {
        let input = MetricInput::Youtube(YouTubeMetrics {
            subscriber_count: 1_000,
            monthly_view_count: 20_000,
            engagement_pct: 4.0,
            content_category: ContentCategory::Gaming,
        });
        let result = estimate(&input, FormulaVersion::V2);
        let entry = CalculationLogEntry::from_estimate(Uuid::new_v4(), &input, &result);
        assert_eq!(entry.content_type.as_deref(), Some("gaming"));
        assert_eq!(entry.subscribers, Some(1_000));
        assert!(!entry.has_discount);
    }

    #[test]
    fn account_access_rules() {
        let owner = Uuid::new_v4();
        let member = Account {
            id: owner,
            role: AccountRole::Member,
        };
        let stranger = Account {
            id: Uuid::new_v4(),
            role: AccountRole::Member,
        };
        let admin = Account {
            id: Uuid::new_v4(),
            role: AccountRole::Admin,
        };
        assert!(member.can_access(owner));
        assert!(!stranger.can_access(owner));
        assert!(admin.can_access(owner));
    }

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken::new("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
        assert_eq!(token.as_str(), "super-secret");
    }
}
