use super::*;
use crate::record_store::CalculationRecordStore;
use crate::test_support::{
    fixture, instagram, named, tiktok, token, youtube, Fixture, ADMIN_TOKEN, MEMBER_TOKEN,
    OTHER_TOKEN,
};
use ratekit_core::{EstimateResult, FormulaVersion};
use serde_json::Value;

async fn seed(fx: &Fixture) -> Vec<CalculationRecord> {
    let store = CalculationRecordStore::new(&fx.collaborator, FormulaVersion::V1);
    let mut saved = Vec::new();
    for (tok, input) in [
        (MEMBER_TOKEN, instagram()),
        (MEMBER_TOKEN, tiktok()),
        (OTHER_TOKEN, tiktok()),
        (MEMBER_TOKEN, youtube()),
    ] {
        saved.push(
            store
                .save(&token(tok), named(input, None))
                .await
                .expect("save"),
        );
    }
    saved
}

#[tokio::test]
async fn empty_history_is_empty_vec() {
    let fx = fixture().await;
    let reader = HistoryReader::new(&fx.collaborator);

    let records = reader
        .list(&token(MEMBER_TOKEN), &HistoryQuery::default())
        .await
        .expect("list");
    assert!(records.is_empty());
}

#[tokio::test]
async fn list_requires_session() {
    let fx = fixture().await;
    let reader = HistoryReader::new(&fx.collaborator);

    let err = reader
        .list(&token("expired"), &HistoryQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authorization(AuthorizationError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn list_returns_own_records_newest_first() {
    let fx = fixture().await;
    let saved = seed(&fx).await;
    let reader = HistoryReader::new(&fx.collaborator);

    let records = reader
        .list(&token(MEMBER_TOKEN), &HistoryQuery::default())
        .await
        .expect("list");

    let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![saved[3].id, saved[1].id, saved[0].id]);
    assert!(records.iter().all(|r| r.account_id == fx.member.id));
}

#[tokio::test]
async fn list_honors_order_platform_and_limit() {
    let fx = fixture().await;
    let saved = seed(&fx).await;
    let reader = HistoryReader::new(&fx.collaborator);

    let oldest = reader
        .list(
            &token(MEMBER_TOKEN),
            &HistoryQuery {
                order: HistoryOrder::OldestFirst,
                limit: Some(2),
                ..HistoryQuery::default()
            },
        )
        .await
        .expect("list");
    let ids: Vec<Uuid> = oldest.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![saved[0].id, saved[1].id]);

    let tiktok_only = reader
        .list(
            &token(MEMBER_TOKEN),
            &HistoryQuery {
                platform: Some(Platform::Tiktok),
                ..HistoryQuery::default()
            },
        )
        .await
        .expect("list");
    assert_eq!(tiktok_only.len(), 1);
    assert_eq!(tiktok_only[0].id, saved[1].id);
}

#[tokio::test]
async fn list_all_is_admin_only() {
    let fx = fixture().await;
    seed(&fx).await;
    let reader = HistoryReader::new(&fx.collaborator);

    let err = reader
        .list_all(&token(MEMBER_TOKEN), &HistoryQuery::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let everything = reader
        .list_all(&token(ADMIN_TOKEN), &HistoryQuery::default())
        .await
        .expect("list_all");
    assert_eq!(everything.len(), 4);
    assert!(everything.iter().any(|r| r.account_id == fx.other.id));
    assert!(everything.iter().all(|r| r.account_id != fx.admin.id));
}

#[tokio::test]
async fn get_enforces_ownership() {
    let fx = fixture().await;
    let saved = seed(&fx).await;
    let reader = HistoryReader::new(&fx.collaborator);

    let err = reader
        .get(&token(OTHER_TOKEN), saved[0].id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authorization(AuthorizationError::NotPermitted)
    ));

    let as_admin = reader
        .get(&token(ADMIN_TOKEN), saved[0].id)
        .await
        .expect("admin get");
    assert_eq!(as_admin, saved[0]);

    let missing = reader
        .get(&token(MEMBER_TOKEN), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound));
}

#[tokio::test]
async fn stale_records_are_returned_as_stored() {
    let fx = fixture().await;
    let mut row = serde_json::Map::new();
    row.insert("user_id".into(), Value::from(fx.member.id.to_string()));
    row.insert("platform".into(), Value::from("tiktok"));
    row.insert("name".into(), Value::from("Imported"));
    row.insert("formula_version".into(), Value::from("v1"));
    row.insert(
        "data".into(),
        serde_json::to_value(tiktok()).expect("serialize"),
    );
    let stored_result = EstimateResult {
        post_value: 12.34,
        premium_value: None,
    };
    row.insert(
        "result".into(),
        serde_json::to_value(stored_result).expect("serialize"),
    );
    fx.collaborator
        .insert(Table::SavedCalculations, row)
        .await
        .expect("insert");

    let records = HistoryReader::new(&fx.collaborator)
        .list(&token(MEMBER_TOKEN), &HistoryQuery::default())
        .await
        .expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].result, stored_result);
    assert!(!records[0].reproduces());
}

#[tokio::test]
async fn unavailable_collaborator_is_persistence_error() {
    let fx = fixture().await;
    seed(&fx).await;
    fx.collaborator.set_unavailable(true).await;

    let err = HistoryReader::new(&fx.collaborator)
        .list(&token(MEMBER_TOKEN), &HistoryQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
}
