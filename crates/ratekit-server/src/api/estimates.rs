use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use ratekit_core::{Breakdown, EstimateResult, FormulaVersion, MetricInput, Platform};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{json_body, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct EstimateData {
    platform: Platform,
    /// Only meaningful for YouTube; reported for every platform so clients
    /// can store it alongside the figures.
    formula_version: FormulaVersion,
    result: EstimateResult,
    breakdown: Breakdown,
}

/// POST /api/v1/estimates — price a set of metrics without saving anything.
pub(super) async fn create_estimate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<MetricInput>, JsonRejection>,
) -> Result<Json<ApiResponse<EstimateData>>, ApiError> {
    let input = json_body(&req_id.0, payload)?;
    input
        .validate()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let breakdown = Breakdown::of(&input, state.youtube_formula);
    let data = EstimateData {
        platform: input.platform(),
        formula_version: state.youtube_formula,
        result: breakdown.to_result(),
        breakdown,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
