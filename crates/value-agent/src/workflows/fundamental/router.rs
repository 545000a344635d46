use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{AnalysisError, FundamentalAgent, FundamentalRequest};
use crate::error::{error_response, AppError};
use crate::storage::{FactorCache, ObservationEntry, ObservationPool};

/// Routes for the factor pipeline, its cache and the observation pool.
pub fn fundamental_router<C, P>(agent: Arc<FundamentalAgent<C, P>>) -> Router
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    Router::new()
        .route("/api/factors/analyze", post(analyze_handler::<C, P>))
        .route("/api/factors/:stock_code", get(cached_handler::<C, P>))
        .route(
            "/api/observation",
            get(list_observation_handler::<C, P>).post(add_observation_handler::<C, P>),
        )
        .route(
            "/api/observation/:stock_code",
            delete(remove_observation_handler::<C, P>),
        )
        .with_state(agent)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeFactorsBody {
    #[serde(flatten)]
    request: FundamentalRequest,
    #[serde(default)]
    observe: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationBody {
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    conclusion: String,
}

pub(crate) async fn analyze_handler<C, P>(
    State(agent): State<Arc<FundamentalAgent<C, P>>>,
    payload: Result<axum::Json<AnalyzeFactorsBody>, JsonRejection>,
) -> Response
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    let axum::Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    match agent.analyze(body.request).await {
        Ok(analysis) => {
            let observed = body.observe && agent.add_to_observation(&analysis);
            let payload = json!({
                "success": true,
                "data": analysis,
                "observed": observed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err @ (AnalysisError::Validation(_) | AnalysisError::MissingStockCode)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn cached_handler<C, P>(
    State(agent): State<Arc<FundamentalAgent<C, P>>>,
    Path(stock_code): Path<String>,
) -> Response
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    match agent.cached_analysis(&stock_code) {
        Ok(entry) => {
            let payload = json!({ "success": true, "data": entry });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err @ AnalysisError::NotCached { .. }) => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn list_observation_handler<C, P>(
    State(agent): State<Arc<FundamentalAgent<C, P>>>,
) -> Response
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    let payload = json!({ "success": true, "data": agent.observations() });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn add_observation_handler<C, P>(
    State(agent): State<Arc<FundamentalAgent<C, P>>>,
    payload: Result<axum::Json<ObservationBody>, JsonRejection>,
) -> Response
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    let axum::Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let code = body.code.trim().to_string();
    if code.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "缺少股票代码");
    }

    let entry = ObservationEntry::new(code, body.name, body.conclusion);
    if agent.observe(entry.clone()) {
        let payload = json!({ "success": true, "data": entry });
        (StatusCode::CREATED, axum::Json(payload)).into_response()
    } else {
        error_response(StatusCode::CONFLICT, "股票已在观察池中或写入失败")
    }
}

pub(crate) async fn remove_observation_handler<C, P>(
    State(agent): State<Arc<FundamentalAgent<C, P>>>,
    Path(stock_code): Path<String>,
) -> Response
where
    C: FactorCache + 'static,
    P: ObservationPool + 'static,
{
    if agent.remove_observation(&stock_code) {
        let payload = json!({ "success": true, "data": { "code": stock_code } });
        (StatusCode::OK, axum::Json(payload)).into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("观察池中没有 {stock_code}"))
    }
}
