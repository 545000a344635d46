use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use value_agent::config::{LlmConfig, LlmProvider};
use value_agent::llm::{model_from_config, LanguageModel, OpenAiCompatibleClient};
use value_agent::market::MarketData;
use value_agent::workflows::value::{
    analyst_from_config, AnalystStatus, Decision, Recommendation, ValueInvestmentAgent,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
    LlmConfig {
        provider: LlmProvider::OpenAi,
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.1,
        max_tokens: 1000,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn offline_agent_rates_every_sample_company() {
    let llm = llm_config("http://127.0.0.1:9", None);
    let model = model_from_config(&llm).expect("offline model");
    let analyst = analyst_from_config(model, &llm);
    assert_eq!(analyst.name(), "heuristic");

    let agent = ValueInvestmentAgent::new(MarketData::offline(), analyst);
    let mut decisions = Vec::new();
    for stock in agent.stocks() {
        let report = agent
            .analyze_code(&stock.code, None, false)
            .await
            .expect("sample code resolves");
        decisions.push((stock.code, report.traditional_analysis.final_decision));
    }

    assert_eq!(
        decisions,
        vec![
            ("600519.SH".to_string(), Decision::StrongRecommend),
            ("000858.SZ".to_string(), Decision::StrongRecommend),
            ("600000.SH".to_string(), Decision::Avoid),
        ]
    );
}

#[tokio::test]
async fn remote_analyst_reply_drives_the_blend() {
    let server = MockServer::start().await;
    let content = json!({
        "analysis_summary": "高毛利品牌龙头",
        "investment_recommendation": "卖出",
        "confidence_score": 0.6,
        "risk_assessment": "高",
        "key_findings": ["估值偏高"],
        "recommendation_reasoning": "等待回调",
        "next_steps": ["跟踪季报"]
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })))
        .mount(&server)
        .await;

    let llm = llm_config(&server.uri(), Some("test-key"));
    let model: Arc<dyn LanguageModel> = Arc::new(
        OpenAiCompatibleClient::new(&server.uri(), "test-key", llm.timeout)
            .expect("client builds"),
    );
    let agent = ValueInvestmentAgent::new(MarketData::offline(), analyst_from_config(model, &llm));

    let report = agent
        .analyze_code("600519", Some("现在估值贵吗"), false)
        .await
        .expect("catalog hit");

    assert!(matches!(
        report.analyst_status,
        AnalystStatus::Completed { .. }
    ));
    assert_eq!(
        report.deep_analysis.investment_recommendation,
        Recommendation::Sell
    );
    // Rule level 5 blended with a sell (level 1) lands at 3.4.
    assert_eq!(report.integrated_recommendation.label, "⚠️  中性观察");
    assert_eq!(agent.conversation_history().len(), 2);
}

#[tokio::test]
async fn unreachable_provider_degrades_to_neutral_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let llm = llm_config(&server.uri(), Some("test-key"));
    let model = model_from_config(&llm).expect("client builds");
    let agent = ValueInvestmentAgent::new(MarketData::offline(), analyst_from_config(model, &llm));

    let report = agent
        .analyze_code("600000.SH", None, false)
        .await
        .expect("catalog hit");
    assert!(matches!(
        report.analyst_status,
        AnalystStatus::Fallback { .. }
    ));
    assert_eq!(report.deep_analysis.confidence_score, 0.5);
    // Rule level 1 with the neutral level 2 blends to 1.4.
    assert_eq!(report.integrated_recommendation.label, "❌ 规避");

    let answer = agent.ask_follow_up("还有机会吗").await;
    assert_eq!(answer.answer, "追问失败，无法提供回答");
}
