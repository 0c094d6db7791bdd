mod calculations;
mod estimates;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use ratekit_core::FormulaVersion;
use ratekit_store::{Collaborator, ServiceError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, require_session, RateLimitState, RequestId};

/// Default and ceiling for history page sizes.
#[derive(Debug, Clone, Copy)]
pub struct HistoryLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub collaborator: Arc<dyn Collaborator>,
    pub youtube_formula: FormulaVersion,
    pub history: HistoryLimits,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    storage: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Clamp a requested page size to `[1, max]`, falling back to the default.
pub(super) fn normalize_limit(limit: Option<i64>, limits: HistoryLimits) -> u32 {
    let max = i64::from(limits.max_limit.max(1));
    let requested = limit.unwrap_or_else(|| i64::from(limits.default_limit));
    u32::try_from(requested.clamp(1, max)).unwrap_or(limits.max_limit)
}

pub(super) fn map_service_error(request_id: String, error: &ServiceError) -> ApiError {
    let message = match error {
        ServiceError::Validation(v) => v.to_string(),
        ServiceError::Persistence(e) => {
            tracing::error!(error = %e, "storage call failed");
            "storage temporarily unavailable, try again".to_string()
        }
        other => other.to_string(),
    };
    ApiError::new(request_id, error.code(), message)
}

/// Unwrap a JSON body, turning malformed or mistyped payloads into a
/// `validation_error` instead of axum's plain-text rejection.
pub(super) fn json_body<T>(
    request_id: &str,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::new(request_id, "validation_error", rejection.body_text()))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn session_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/calculations",
            get(calculations::list_calculations).post(calculations::save_calculation),
        )
        .route(
            "/api/v1/calculations/log",
            post(calculations::log_calculation),
        )
        .route(
            "/api/v1/calculations/{id}",
            get(calculations::get_calculation).delete(calculations::delete_calculation),
        )
        .route(
            "/api/v1/admin/calculations",
            get(calculations::list_all_calculations),
        )
        .layer(axum::middleware::from_fn(require_session))
}

fn rate_limited_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/estimates", post(estimates::create_estimate))
        .merge(session_router())
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(rate_limited_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.collaborator.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    storage: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        storage: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
