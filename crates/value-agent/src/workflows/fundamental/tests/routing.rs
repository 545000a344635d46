use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::fundamental::fundamental_router;
use crate::workflows::fundamental::router::list_observation_handler;

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn analyze_route_returns_envelope_and_observes_on_request() {
    let (agent, _, pool) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let router = fundamental_router(Arc::new(agent));

    let body = json!({
        "stock_code": "600519.SH",
        "company_name": "贵州茅台",
        "factor_data": serde_json::to_value(strong_factors()).expect("factors encode"),
        "business_data": { "business_core": "高端白酒" },
        "observe": true,
    });

    let response = router
        .oneshot(json_request(Method::POST, "/api/factors/analyze", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["observed"], true);
    assert_eq!(payload["data"]["scorecard"]["grade"], "优秀");
    assert_eq!(payload["data"]["minefield"]["message"], "通过排雷检查");
    assert_eq!(payload["data"]["model_status"]["status"], "generated");
    assert_eq!(pool.entries.lock().expect("pool mutex").len(), 1);
}

#[tokio::test]
async fn analyze_route_rejects_invalid_factors() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let router = fundamental_router(Arc::new(agent));

    let body = json!({
        "stock_code": "600519.SH",
        "factor_data": { "roe": 20.0, "pe": null },
    });

    let response = router
        .oneshot(json_request(Method::POST, "/api/factors/analyze", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    let error = payload["error"].as_str().expect("error message");
    assert!(error.contains("因子值为空: pe"));
    assert!(error.contains("缺少因子: gross_margin"));
}

#[tokio::test]
async fn cached_route_returns_not_found_then_entry() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::failing("offline")));
    let agent = Arc::new(agent);
    let router = fundamental_router(agent.clone());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/factors/600519.SH")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    agent
        .analyze(request(strong_factors()))
        .await
        .expect("analysis succeeds");

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/factors/600519.SH")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["stock_code"], "600519.SH");
    assert_eq!(
        payload["data"]["analysis_result"]["model_status"]["status"],
        "fallback"
    );
}

#[tokio::test]
async fn observation_routes_add_conflict_and_remove() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let router = fundamental_router(Arc::new(agent));
    let entry = json!({ "code": "000858.SZ", "name": "五粮液", "conclusion": "观望" });

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/observation", entry.clone()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/observation", entry))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/observation/000858.SZ")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/observation/000858.SZ")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_handler_wraps_pool_entries() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let agent = Arc::new(agent);
    assert!(agent.observe(crate::storage::ObservationEntry::new(
        "600519.SH",
        "贵州茅台",
        "买入"
    )));

    let response = list_observation_handler::<MemoryCache, MemoryPool>(State(agent)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"][0]["code"], "600519.SH");
}

#[tokio::test]
async fn malformed_bodies_get_the_error_envelope() {
    let (agent, _, pool) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let router = fundamental_router(Arc::new(agent));

    let broken = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/factors/analyze")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(broken.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(broken).await;
    assert_eq!(payload["success"], false);
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .starts_with("请求体无效"));

    let missing_code = router
        .oneshot(json_request(
            Method::POST,
            "/api/observation",
            json!({ "name": "贵州茅台" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(missing_code.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json_body(missing_code).await["success"], false);
    assert!(pool.entries.lock().expect("pool mutex").is_empty());
}
