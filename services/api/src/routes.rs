use crate::infra::{Agents, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use value_agent::error::{error_response, AppError};
use value_agent::workflows::fundamental::fundamental_router;
use value_agent::workflows::value::ValueInvestmentAgent;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RouteError {
    #[error("缺少股票代码")]
    MissingCode,
    #[error("问题不能为空")]
    EmptyQuestion,
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeRequest {
    #[serde(default)]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) user_question: Option<String>,
    #[serde(default)]
    pub(crate) real_time: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    pub(crate) question: String,
}

/// Every HTTP route: operational endpoints, the value routes and the factor routes.
pub(crate) fn app_router(agents: &Agents) -> Router {
    fundamental_router(agents.fundamental.clone())
        .merge(value_router(agents.value.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) fn value_router(agent: Arc<ValueInvestmentAgent>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_endpoint))
        .route("/api/ask", post(ask_endpoint))
        .route("/api/stocks", get(stocks_endpoint))
        .route("/api/history", get(history_endpoint).delete(clear_history_endpoint))
        .with_state(agent)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn analyze_endpoint(
    State(agent): State<Arc<ValueInvestmentAgent>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(body) = payload.map_err(|rejection| AppError::from(rejection).into_response())?;
    let code = body.code.trim();
    if code.is_empty() {
        return Err(RouteError::MissingCode.into_response());
    }

    let report = agent
        .analyze_code(code, body.user_question.as_deref(), body.real_time)
        .await
        .map_err(|err| AppError::from(err).into_response())?;

    Ok(Json(json!({ "success": true, "data": report })).into_response())
}

pub(crate) async fn ask_endpoint(
    State(agent): State<Arc<ValueInvestmentAgent>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, Response> {
    let Json(body) = payload.map_err(|rejection| AppError::from(rejection).into_response())?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(RouteError::EmptyQuestion.into_response());
    }

    let answer = agent.ask_follow_up(question).await;
    Ok(Json(json!({ "success": true, "data": answer })))
}

pub(crate) async fn stocks_endpoint(
    State(agent): State<Arc<ValueInvestmentAgent>>,
) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": agent.stocks() }))
}

pub(crate) async fn history_endpoint(
    State(agent): State<Arc<ValueInvestmentAgent>>,
) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": agent.conversation_history() }))
}

pub(crate) async fn clear_history_endpoint(
    State(agent): State<Arc<ValueInvestmentAgent>>,
) -> Json<serde_json::Value> {
    agent.clear_history();
    Json(json!({ "success": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use value_agent::market::MarketData;
    use value_agent::workflows::value::HeuristicAnalyst;

    fn value_agent() -> Arc<ValueInvestmentAgent> {
        Arc::new(ValueInvestmentAgent::new(
            MarketData::offline(),
            Arc::new(HeuristicAnalyst),
        ))
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn analyze_returns_blended_report() {
        let response = value_router(value_agent())
            .oneshot(post_json(
                "/api/analyze",
                json!({ "code": "600519", "user_question": "安全边际够吗" }),
            ))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["company"]["code"], "600519.SH");
        assert_eq!(body["data"]["traditional_analysis"]["avg_score"], 93);
        assert_eq!(body["data"]["integrated_recommendation"]["label"], "🌟 强烈推荐");
        assert_eq!(body["data"]["deep_analysis"]["investment_recommendation"], "买入");
        assert_eq!(body["data"]["analyst_status"]["status"], "completed");
    }

    #[tokio::test]
    async fn analyze_maps_lookup_failures_to_client_errors() {
        let router = value_router(value_agent());

        let missing = router
            .clone()
            .oneshot(post_json("/api/analyze", json!({ "code": "  " })))
            .await
            .expect("router responds");
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(missing).await["error"], "缺少股票代码");

        let unknown = router
            .clone()
            .oneshot(post_json("/api/analyze", json!({ "code": "601398" })))
            .await
            .expect("router responds");
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(unknown).await["success"], false);

        let invalid = router
            .oneshot(post_json("/api/analyze", json!({ "code": "abc" })))
            .await
            .expect("router responds");
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let router = value_router(value_agent());

        let broken = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
        let body = read_json(broken).await;
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .starts_with("请求体无效"));

        let wrong_type = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ask")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from("什么是护城河"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(wrong_type).await["success"], false);

        let wrong_field = router
            .oneshot(post_json("/api/analyze", json!({ "code": 600519 })))
            .await
            .expect("router responds");
        assert_eq!(wrong_field.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(wrong_field).await["success"], false);
    }

    #[tokio::test]
    async fn ask_requires_a_question_and_records_history() {
        let agent = value_agent();
        let router = value_router(agent.clone());

        let empty = router
            .clone()
            .oneshot(post_json("/api/ask", json!({ "question": "" })))
            .await
            .expect("router responds");
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let answered = router
            .clone()
            .oneshot(post_json("/api/ask", json!({ "question": "什么是护城河" })))
            .await
            .expect("router responds");
        assert_eq!(answered.status(), StatusCode::OK);
        let body = read_json(answered).await;
        assert_eq!(body["data"]["confidence"], 0.8);
        assert_eq!(agent.conversation_history().len(), 2);

        let cleared = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/history")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(cleared.status(), StatusCode::OK);
        assert!(agent.conversation_history().is_empty());
    }

    #[tokio::test]
    async fn stocks_lists_catalog_with_industries() {
        let Json(body) = stocks_endpoint(State(value_agent())).await;
        let stocks = body["data"].as_array().expect("array of stocks");
        assert_eq!(stocks.len(), 3);
        assert_eq!(stocks[1]["code"], "000858.SZ");
        assert_eq!(stocks[1]["industry"], "白酒");
    }

    #[tokio::test]
    async fn app_router_serves_factor_and_value_routes() {
        use crate::infra::Agents;
        use std::time::Duration;
        use value_agent::config::{LlmConfig, LlmProvider};
        use value_agent::llm::OfflineModel;
        use value_agent::storage::{JsonFactorCache, JsonObservationPool};
        use value_agent::workflows::fundamental::{FundamentalAgent, FundamentalConfig};

        let dir = tempfile::tempdir().expect("temp dir");
        let llm = LlmConfig {
            provider: LlmProvider::Kimi,
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            model: "moonshot-v1-8k".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout: Duration::from_secs(2),
        };
        let fundamental = FundamentalAgent::new(
            Arc::new(JsonFactorCache::new(dir.path().join("factor_cache.json"))),
            Arc::new(JsonObservationPool::new(dir.path().join("observation_pool.json"))),
            Arc::new(OfflineModel),
            llm,
            FundamentalConfig::default(),
        );
        let agents = Agents {
            value: value_agent(),
            fundamental: Arc::new(fundamental),
        };
        let router = app_router(&agents);

        let added = router
            .clone()
            .oneshot(post_json(
                "/api/observation",
                json!({ "code": "600519.SH", "name": "贵州茅台", "conclusion": "观望" }),
            ))
            .await
            .expect("router responds");
        assert_eq!(added.status(), StatusCode::CREATED);
        assert!(dir.path().join("observation_pool.json").exists());

        let health = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(agents.fundamental.observations().len(), 1);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state
            .readiness
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
