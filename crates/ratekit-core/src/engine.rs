//! Rate estimation formulas.
//!
//! Every function here is pure: the same input always produces the same
//! bits. Inputs are expected to have passed [`MetricInput::validate`]; the
//! engine itself never fails.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::metrics::{
    AudienceScope, ContentCategory, InstagramMetrics, MetricInput, TikTokMetrics,
    ValidationError, YouTubeMetrics,
};

const INSTAGRAM_SMALL_RATE: f64 = 0.014;
const INSTAGRAM_LARGE_RATE: f64 = 0.008;
const INSTAGRAM_LICENSE_RATE: f64 = 13.32;
const INSTAGRAM_LICENSE_FOLLOWER_UNIT: f64 = 50_000.0;

const TIKTOK_HIGH_VALUE_FACTOR: f64 = 0.4;
const TIKTOK_LOW_VALUE_FACTOR: f64 = 0.24;
const TIKTOK_HIGH_VALUE_THRESHOLD: f64 = 10_000.0;
const TIKTOK_MIN_ENGAGEMENT_RATE: f64 = 0.05;
const TIKTOK_LOW_ENGAGEMENT_PENALTY: f64 = 0.7;

const DISCOUNT_FACTOR: f64 = 0.9;

/// Which YouTube formula to apply.
///
/// `V1` is the consumer calculator (no content multiplier); `V2` is the
/// richer formula with higher per-unit rates and a content-category
/// multiplier. Instagram and TikTok have a single formula and ignore this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaVersion {
    #[default]
    V1,
    V2,
}

impl FormulaVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FormulaVersion::V1 => "v1",
            FormulaVersion::V2 => "v2",
        }
    }
}

impl std::fmt::Display for FormulaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulaVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(FormulaVersion::V1),
            "v2" => Ok(FormulaVersion::V2),
            other => Err(ValidationError::new(
                "formula_version",
                format!("must be v1 or v2, got '{other}'"),
            )),
        }
    }
}

/// Monetary estimate for one set of metrics, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    /// Value of a standard post.
    pub post_value: f64,
    /// Value of the premium format (Instagram reels). `None` elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_value: Option<f64>,
}

impl EstimateResult {
    /// True when every figure of `other` is within one cent of `self`.
    #[must_use]
    pub fn matches_within_cent(&self, other: &EstimateResult) -> bool {
        const TOLERANCE: f64 = 0.01 + 1e-9;
        let post_ok = (self.post_value - other.post_value).abs() <= TOLERANCE;
        let premium_ok = match (self.premium_value, other.premium_value) {
            (Some(a), Some(b)) => (a - b).abs() <= TOLERANCE,
            (None, None) => true,
            _ => false,
        };
        post_ok && premium_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InstagramBreakdown {
    pub base_value: f64,
    pub min_reach_value: f64,
    pub max_reach_value: f64,
    pub license_value: f64,
    pub total: f64,
    pub discount_factor: f64,
    pub post_value: f64,
    pub premium_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TikTokBreakdown {
    pub engagement_rate: f64,
    pub calculated: f64,
    pub scaled: f64,
    pub engagement_penalty: f64,
    pub adjusted: f64,
    pub final_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YouTubeBreakdown {
    pub formula_version: FormulaVersion,
    pub base_value: f64,
    pub engagement_multiplier: f64,
    pub content_multiplier: f64,
    pub estimated: f64,
    /// `estimated` rounded to cents.
    pub result: f64,
}

/// Unrounded intermediate figures for whichever platform was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum Breakdown {
    Instagram(InstagramBreakdown),
    Tiktok(TikTokBreakdown),
    Youtube(YouTubeBreakdown),
}

impl Breakdown {
    #[must_use]
    pub fn of(input: &MetricInput, youtube_formula: FormulaVersion) -> Self {
        match input {
            MetricInput::Instagram(m) => Breakdown::Instagram(instagram_breakdown(m)),
            MetricInput::Tiktok(m) => Breakdown::Tiktok(tiktok_breakdown(m)),
            MetricInput::Youtube(m) => Breakdown::Youtube(youtube_breakdown(m, youtube_formula)),
        }
    }

    /// Round the headline figures to cents. The Instagram premium is doubled
    /// after rounding so it stays exactly twice the post value.
    #[must_use]
    pub fn to_result(&self) -> EstimateResult {
        match self {
            Breakdown::Instagram(b) => {
                let post_value = round_currency(b.post_value);
                EstimateResult {
                    post_value,
                    premium_value: Some(2.0 * post_value),
                }
            }
            Breakdown::Tiktok(b) => EstimateResult {
                post_value: round_currency(b.final_value),
                premium_value: None,
            },
            Breakdown::Youtube(b) => EstimateResult {
                post_value: b.result,
                premium_value: None,
            },
        }
    }
}

/// Estimate the value of `input`. `youtube_formula` only affects YouTube.
#[must_use]
pub fn estimate(input: &MetricInput, youtube_formula: FormulaVersion) -> EstimateResult {
    Breakdown::of(input, youtube_formula).to_result()
}

#[must_use]
pub fn instagram_breakdown(m: &InstagramMetrics) -> InstagramBreakdown {
    #[allow(clippy::cast_precision_loss)]
    let followers = m.follower_count as f64;

    let rate_per_follower = match m.audience_scope {
        AudienceScope::Small => INSTAGRAM_SMALL_RATE,
        AudienceScope::Large => INSTAGRAM_LARGE_RATE,
    };
    let base_value = followers * rate_per_follower;
    let min_reach_value = followers * (m.min_reach_pct / 100.0) * 8.0 / 1000.0;
    let max_reach_value = followers * (m.max_reach_pct / 100.0) * 10.0 / 1000.0;
    let license_value = INSTAGRAM_LICENSE_RATE
        * (followers / INSTAGRAM_LICENSE_FOLLOWER_UNIT)
        * f64::from(m.license_days);
    let total = base_value + min_reach_value + max_reach_value + license_value;
    let discount_factor = discount_factor(m.discount_requested);

    InstagramBreakdown {
        base_value,
        min_reach_value,
        max_reach_value,
        license_value,
        total,
        discount_factor,
        post_value: total * discount_factor,
        premium_value: total * 2.0 * discount_factor,
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tiktok_breakdown(m: &TikTokMetrics) -> TikTokBreakdown {
    let followers = m.follower_count as f64;
    let views = m.view_count as f64;
    let likes = m.like_count as f64;
    let comments = m.comment_count as f64;

    let engagement_rate = if m.view_count > 0 {
        (likes + comments) / views
    } else {
        0.0
    };
    let calculated = followers * 0.004 + views * 0.004 + likes * 0.008 + comments * 0.08;
    let scaled = if calculated > TIKTOK_HIGH_VALUE_THRESHOLD {
        calculated * TIKTOK_HIGH_VALUE_FACTOR
    } else {
        calculated * TIKTOK_LOW_VALUE_FACTOR
    };
    let engagement_penalty = if engagement_rate < TIKTOK_MIN_ENGAGEMENT_RATE {
        TIKTOK_LOW_ENGAGEMENT_PENALTY
    } else {
        1.0
    };
    let adjusted = scaled * engagement_penalty;

    TikTokBreakdown {
        engagement_rate,
        calculated,
        scaled,
        engagement_penalty,
        adjusted,
        final_value: adjusted * discount_factor(m.discount_requested),
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn youtube_breakdown(m: &YouTubeMetrics, version: FormulaVersion) -> YouTubeBreakdown {
    let subscribers = m.subscriber_count as f64;
    let monthly_views = m.monthly_view_count as f64;

    let (base_value, content_multiplier) = match version {
        FormulaVersion::V1 => (subscribers * 0.01 + monthly_views * 0.001, 1.0),
        FormulaVersion::V2 => (
            subscribers * 0.05 + monthly_views * 0.01,
            content_multiplier(m.content_category),
        ),
    };
    let engagement_multiplier = 1.0 + m.engagement_pct / 100.0;
    let estimated = base_value * engagement_multiplier * content_multiplier;

    YouTubeBreakdown {
        formula_version: version,
        base_value,
        engagement_multiplier,
        content_multiplier,
        estimated,
        result: round_currency(estimated),
    }
}

fn content_multiplier(category: ContentCategory) -> f64 {
    match category {
        ContentCategory::Education => 1.3,
        ContentCategory::Entertainment => 1.2,
        ContentCategory::Gaming => 1.1,
        ContentCategory::Lifestyle => 1.15,
        ContentCategory::Other => 1.0,
    }
}

fn discount_factor(requested: bool) -> f64 {
    if requested {
        DISCOUNT_FACTOR
    } else {
        1.0
    }
}

/// Round to 2 decimal places, half away from zero.
///
/// Rounds the shortest decimal form of `value` (what `Display` prints), so
/// `1.005` rounds up even though its `f64` representation sits just below the
/// midpoint. Values `Decimal` cannot hold are returned unchanged.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn reference_instagram() -> InstagramMetrics {
        InstagramMetrics {
            follower_count: 10_000,
            audience_scope: AudienceScope::Small,
            min_reach_pct: 5.0,
            max_reach_pct: 5.0,
            engagement_pct: 3.0,
            license_days: 1,
            discount_requested: false,
        }
    }

    fn reference_tiktok() -> TikTokMetrics {
        TikTokMetrics {
            follower_count: 10_000,
            view_count: 50_000,
            like_count: 5_000,
            comment_count: 500,
            discount_requested: false,
        }
    }

    #[test]
    fn instagram_reference_example() {
        let b = instagram_breakdown(&reference_instagram());
        assert_close(b.base_value, 140.0);
        assert_close(b.min_reach_value, 4.0);
        assert_close(b.max_reach_value, 5.0);
        assert_close(b.license_value, 2.664);
        assert_close(b.total, 151.664);
        assert_close(b.post_value, 151.664);
        assert_close(b.premium_value, 303.328);
    }

    #[test]
    fn instagram_result_is_rounded_to_cents() {
        let result = estimate(
            &MetricInput::Instagram(reference_instagram()),
            FormulaVersion::V1,
        );
        assert_eq!(result.post_value, 151.66);
        assert_eq!(result.premium_value, Some(303.32));
    }

    #[test]
    fn instagram_premium_is_exactly_double_post() {
        let cases = [
            (1_u64, AudienceScope::Small, 0.0, 0.0, 1_u32, false),
            (12_345, AudienceScope::Large, 3.3, 77.7, 30, true),
            (987_654_321, AudienceScope::Small, 99.9, 100.0, 365, true),
            (50_001, AudienceScope::Large, 12.5, 12.5, 7, false),
        ];
        for (followers, scope, min, max, days, discount) in cases {
            let b = instagram_breakdown(&InstagramMetrics {
                follower_count: followers,
                audience_scope: scope,
                min_reach_pct: min,
                max_reach_pct: max,
                engagement_pct: 0.0,
                license_days: days,
                discount_requested: discount,
            });
            assert_eq!(b.post_value, b.total * b.discount_factor);
            assert_eq!(b.premium_value, 2.0 * b.post_value);
        }
    }

    #[test]
    fn rounded_instagram_premium_is_exactly_double_post() {
        let cases = [
            (1_u64, AudienceScope::Small, 0.0, 0.0, 3.0, 1_u32, false),
            (10_000, AudienceScope::Small, 5.0, 50.0, 3.0, 1, false),
            (12_345, AudienceScope::Large, 3.3, 77.7, 1.5, 30, true),
            (987_654_321, AudienceScope::Small, 99.9, 100.0, 7.0, 365, true),
            (50_001, AudienceScope::Large, 12.5, 12.5, 0.0, 7, false),
        ];
        for (followers, scope, min, max, engagement, days, discount) in cases {
            let result = estimate(
                &MetricInput::Instagram(InstagramMetrics {
                    follower_count: followers,
                    audience_scope: scope,
                    min_reach_pct: min,
                    max_reach_pct: max,
                    engagement_pct: engagement,
                    license_days: days,
                    discount_requested: discount,
                }),
                FormulaVersion::V1,
            );
            assert_eq!(result.premium_value, Some(2.0 * result.post_value));
            assert_eq!(result.post_value, round_currency(result.post_value));
        }
    }

    #[test]
    fn full_reach_range_adds_fifty_to_total() {
        let mut m = reference_instagram();
        m.max_reach_pct = 50.0;
        let b = instagram_breakdown(&m);
        assert_close(b.max_reach_value, 50.0);
        assert_close(b.total, 196.664);

        let result = estimate(&MetricInput::Instagram(m), FormulaVersion::V1);
        assert_eq!(result.post_value, 196.66);
        assert_eq!(result.premium_value, Some(393.32));
    }

    #[test]
    fn instagram_large_scope_and_discount() {
        let mut m = reference_instagram();
        m.audience_scope = AudienceScope::Large;
        m.discount_requested = true;
        let b = instagram_breakdown(&m);
        assert_close(b.base_value, 80.0);
        assert_close(b.total, 91.664);
        assert_close(b.post_value, 91.664 * 0.9);
    }

    #[test]
    fn tiktok_reference_example() {
        let b = tiktok_breakdown(&reference_tiktok());
        assert_close(b.calculated, 320.0);
        assert_close(b.scaled, 76.8);
        assert_close(b.engagement_rate, 0.11);
        assert_close(b.engagement_penalty, 1.0);
        assert_close(b.final_value, 76.8);

        let result = estimate(&MetricInput::Tiktok(reference_tiktok()), FormulaVersion::V1);
        assert_eq!(result.post_value, 76.8);
        assert!(result.premium_value.is_none());
    }

    #[test]
    fn tiktok_zero_views_has_zero_engagement() {
        let b = tiktok_breakdown(&TikTokMetrics {
            follower_count: 1_000,
            view_count: 0,
            like_count: 50,
            comment_count: 5,
            discount_requested: false,
        });
        assert_eq!(b.engagement_rate, 0.0);
        assert_eq!(b.engagement_penalty, 0.7);
        assert!(b.final_value.is_finite());
    }

    #[test]
    fn tiktok_high_value_factor_and_low_engagement_penalty() {
        // 3_000_000 * 0.004 = 12_000 > threshold; engagement 0.001 < 0.05.
        let b = tiktok_breakdown(&TikTokMetrics {
            follower_count: 0,
            view_count: 3_000_000,
            like_count: 3_000,
            comment_count: 0,
            discount_requested: true,
        });
        assert_close(b.calculated, 12_024.0);
        assert_close(b.scaled, 12_024.0 * 0.4);
        assert_close(b.adjusted, 12_024.0 * 0.4 * 0.7);
        assert_close(b.final_value, 12_024.0 * 0.4 * 0.7 * 0.9);
    }

    #[test]
    fn tiktok_threshold_is_exclusive() {
        // calculated == 10_000 exactly stays on the low factor.
        let b = tiktok_breakdown(&TikTokMetrics {
            follower_count: 2_500_000,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            discount_requested: false,
        });
        assert_close(b.calculated, 10_000.0);
        assert_close(b.scaled, 2_400.0);
    }

    #[test]
    fn youtube_v1_ignores_content_category() {
        let m = YouTubeMetrics {
            subscriber_count: 100_000,
            monthly_view_count: 1_000_000,
            engagement_pct: 5.0,
            content_category: ContentCategory::Education,
        };
        let b = youtube_breakdown(&m, FormulaVersion::V1);
        assert_close(b.base_value, 2_000.0);
        assert_close(b.content_multiplier, 1.0);
        assert_eq!(b.result, 2_100.0);
    }

    #[test]
    fn youtube_v2_applies_content_multiplier() {
        let m = YouTubeMetrics {
            subscriber_count: 100_000,
            monthly_view_count: 1_000_000,
            engagement_pct: 5.0,
            content_category: ContentCategory::Education,
        };
        let b = youtube_breakdown(&m, FormulaVersion::V2);
        assert_close(b.base_value, 15_000.0);
        assert_close(b.content_multiplier, 1.3);
        assert_eq!(b.result, 20_475.0);
    }

    #[test]
    fn youtube_result_is_rounded() {
        let m = YouTubeMetrics {
            subscriber_count: 333,
            monthly_view_count: 7,
            engagement_pct: 3.3,
            content_category: ContentCategory::Lifestyle,
        };
        let b = youtube_breakdown(&m, FormulaVersion::V2);
        assert_eq!(b.result, round_currency(b.estimated));
        let text = b.result.to_string();
        let decimals = text.split('.').nth(1).map_or(0, str::len);
        assert!(decimals <= 2, "{text} has more than two decimals");
    }

    #[test]
    fn estimate_is_idempotent() {
        let inputs = [
            MetricInput::Instagram(reference_instagram()),
            MetricInput::Tiktok(reference_tiktok()),
            MetricInput::Youtube(YouTubeMetrics {
                subscriber_count: 42_424,
                monthly_view_count: 9_999_999,
                engagement_pct: 17.3,
                content_category: ContentCategory::Gaming,
            }),
        ];
        for input in &inputs {
            for version in [FormulaVersion::V1, FormulaVersion::V2] {
                let a = estimate(input, version);
                let b = estimate(input, version);
                assert_eq!(a.post_value.to_bits(), b.post_value.to_bits());
                assert_eq!(
                    a.premium_value.map(f64::to_bits),
                    b.premium_value.map(f64::to_bits)
                );
            }
        }
    }

    #[test]
    fn round_currency_half_away_from_zero() {
        assert_eq!(round_currency(1.005), 1.01);
        assert_eq!(round_currency(2.675), 2.68);
        assert_eq!(round_currency(-1.005), -1.01);
        assert_eq!(round_currency(151.664), 151.66);
        assert_eq!(round_currency(0.0), 0.0);
    }

    #[test]
    fn matches_within_cent() {
        let a = EstimateResult {
            post_value: 10.00,
            premium_value: Some(20.00),
        };
        let b = EstimateResult {
            post_value: 10.01,
            premium_value: Some(19.99),
        };
        let c = EstimateResult {
            post_value: 10.00,
            premium_value: None,
        };
        assert!(a.matches_within_cent(&b));
        assert!(!a.matches_within_cent(&c));
    }

    #[test]
    fn formula_version_parses() {
        assert_eq!("V2".parse::<FormulaVersion>().unwrap(), FormulaVersion::V2);
        assert!("v3".parse::<FormulaVersion>().is_err());
    }
}
