use ratekit_core::{
    Account, AccountRole, AudienceScope, ContentCategory, InstagramMetrics, MetricInput,
    NewCalculation, SessionToken, TikTokMetrics, YouTubeMetrics,
};
use uuid::Uuid;

use crate::memory::InMemoryCollaborator;

pub(crate) const MEMBER_TOKEN: &str = "member-token";
pub(crate) const OTHER_TOKEN: &str = "other-token";
pub(crate) const ADMIN_TOKEN: &str = "admin-token";

pub(crate) struct Fixture {
    pub collaborator: InMemoryCollaborator,
    pub member: Account,
    pub other: Account,
    pub admin: Account,
}

pub(crate) async fn fixture() -> Fixture {
    let collaborator = InMemoryCollaborator::new();
    let account = |role| Account {
        id: Uuid::new_v4(),
        role,
    };
    let member = account(AccountRole::Member);
    let other = account(AccountRole::Member);
    let admin = account(AccountRole::Admin);
    collaborator.add_session(MEMBER_TOKEN, member).await;
    collaborator.add_session(OTHER_TOKEN, other).await;
    collaborator.add_session(ADMIN_TOKEN, admin).await;
    Fixture {
        collaborator,
        member,
        other,
        admin,
    }
}

pub(crate) fn token(raw: &str) -> SessionToken {
    SessionToken::new(raw)
}

pub(crate) fn instagram() -> MetricInput {
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

pub(crate) fn tiktok() -> MetricInput {
    MetricInput::Tiktok(TikTokMetrics {
        follower_count: 10_000,
        view_count: 50_000,
        like_count: 5_000,
        comment_count: 500,
        discount_requested: false,
    })
}

pub(crate) fn youtube() -> MetricInput {
    MetricInput::Youtube(YouTubeMetrics {
        subscriber_count: 1_000,
        monthly_view_count: 20_000,
        engagement_pct: 4.0,
        content_category: ContentCategory::Gaming,
    })
}

pub(crate) fn named(input: MetricInput, name: Option<&str>) -> NewCalculation {
    NewCalculation {
        name: name.map(ToOwned::to_owned),
        input,
    }
}
