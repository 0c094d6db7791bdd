//! Saved calculation and history handlers. Every route here sits behind
//! `require_session`, so a [`SessionToken`] extension is always present.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use ratekit_core::{
    CalculationLogEntry, CalculationRecord, HistoryOrder, HistoryQuery, MetricInput,
    NewCalculation, Platform, SessionToken,
};
use ratekit_store::{CalculationRecordStore, HistoryReader};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    json_body, map_service_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    pub platform: Option<Platform>,
    pub limit: Option<i64>,
    pub order: Option<HistoryOrder>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedData {
    id: Uuid,
    deleted: bool,
}

fn history_query(
    req_id: &str,
    params: Result<Query<HistoryParams>, QueryRejection>,
    state: &AppState,
) -> Result<HistoryQuery, ApiError> {
    let Query(params) = params
        .map_err(|rejection| ApiError::new(req_id, "validation_error", rejection.body_text()))?;
    Ok(HistoryQuery {
        platform: params.platform,
        limit: Some(normalize_limit(params.limit, state.history)),
        order: params.order.unwrap_or_default(),
    })
}

fn record_id(req_id: &str, id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::new(req_id, "validation_error", "id must be a UUID"))
}

/// POST /api/v1/calculations — compute and save a named snapshot.
pub(super) async fn save_calculation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    payload: Result<Json<NewCalculation>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CalculationRecord>>), ApiError> {
    let calculation = json_body(&req_id.0, payload)?;
    let record = CalculationRecordStore::new(state.collaborator.as_ref(), state.youtube_formula)
        .save(&token, calculation)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: record,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/v1/calculations/log — append to the flat estimate log.
pub(super) async fn log_calculation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    payload: Result<Json<MetricInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CalculationLogEntry>>), ApiError> {
    let input = json_body(&req_id.0, payload)?;
    let entry = CalculationRecordStore::new(state.collaborator.as_ref(), state.youtube_formula)
        .log(&token, &input)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: entry,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/calculations — the caller's history.
pub(super) async fn list_calculations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CalculationRecord>>>, ApiError> {
    let query = history_query(&req_id.0, params, &state)?;
    let records = HistoryReader::new(state.collaborator.as_ref())
        .list(&token, &query)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: records,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/admin/calculations — every account's history.
pub(super) async fn list_all_calculations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CalculationRecord>>>, ApiError> {
    let query = history_query(&req_id.0, params, &state)?;
    let records = HistoryReader::new(state.collaborator.as_ref())
        .list_all(&token, &query)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: records,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/calculations/{id}
pub(super) async fn get_calculation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<CalculationRecord>>, ApiError> {
    let id = record_id(&req_id.0, id)?;
    let record = HistoryReader::new(state.collaborator.as_ref())
        .get(&token, id)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: record,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/calculations/{id}
pub(super) async fn delete_calculation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<SessionToken>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    let id = record_id(&req_id.0, id)?;
    CalculationRecordStore::new(state.collaborator.as_ref(), state.youtube_formula)
        .delete(&token, id)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeletedData { id, deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
