use super::common::*;
use crate::storage::{FactorCache, ObservationPool};
use crate::workflows::fundamental::{
    AnalysisError, FactorGrade, FactorKey, ModelStatus, ANALYST_PERSONA,
};
use std::sync::Arc;

#[tokio::test]
async fn analyze_formats_model_reply_and_caches_result() {
    let model = Arc::new(ScriptedModel::replying(MODEL_REPLY));
    let (agent, cache, _) = build_agent(model.clone());

    let analysis = agent
        .analyze(request(strong_factors()))
        .await
        .expect("analysis succeeds");

    assert!(analysis.minefield.passed);
    assert_eq!(analysis.scorecard.grade, FactorGrade::Excellent);
    assert_eq!(analysis.report.conclusion, "买入 护城河清晰且估值合理");
    assert_eq!(analysis.report.risks.len(), 3);
    assert_eq!(
        analysis.model_status,
        ModelStatus::Generated {
            model: "moonshot-v1-8k".to_string()
        }
    );

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].system_prompt, ANALYST_PERSONA);
    assert!(prompts[0].user_prompt.contains("ROE: 25%"));
    assert!(prompts[0].user_prompt.contains("通过排雷检查"));
    assert!(prompts[0].user_prompt.contains("平均评分: 5.00"));

    let cached = cache.get("600519.SH").expect("analysis cached");
    assert_eq!(cached.company_name, "贵州茅台");
    assert_eq!(cached.factor_data.roe, 25.0);
    assert_eq!(cached.analysis_result, analysis);
}

#[tokio::test]
async fn analyze_rejects_incomplete_factors_before_calling_model() {
    let model = Arc::new(ScriptedModel::replying(MODEL_REPLY));
    let (agent, cache, _) = build_agent(model.clone());

    let mut factors = strong_factors();
    factors.remove(FactorKey::Pb);

    match agent.analyze(request(factors)).await {
        Err(AnalysisError::Validation(err)) => {
            assert_eq!(err.errors, vec!["缺少因子: pb".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(model.prompts().is_empty());
    assert!(cache.all().is_empty());
}

#[tokio::test]
async fn analyze_requires_stock_code() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let mut submission = request(strong_factors());
    submission.stock_code = "  ".to_string();

    assert!(matches!(
        agent.analyze(submission).await,
        Err(AnalysisError::MissingStockCode)
    ));
}

#[tokio::test]
async fn model_failure_falls_back_to_quantitative_report() {
    let model = Arc::new(ScriptedModel::failing("connection refused"));
    let (agent, cache, _) = build_agent(model);

    let analysis = agent
        .analyze(request(distressed_factors()))
        .await
        .expect("fallback is not an error");

    assert!(!analysis.minefield.passed);
    assert!(analysis.report.conclusion.starts_with("不碰"));
    assert_eq!(analysis.report.key_facts, vec!["业务核心: 高端白酒".to_string()]);
    assert_eq!(analysis.report.risks, vec![analysis.minefield.message.clone()]);
    match &analysis.model_status {
        ModelStatus::Fallback { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected fallback status, got {other:?}"),
    }
    assert!(cache.get("600519.SH").is_some());
}

#[tokio::test]
async fn headerless_model_reply_yields_empty_report() {
    let model = Arc::new(ScriptedModel::replying("我无法判断这家公司。"));
    let (agent, _, _) = build_agent(model);

    let analysis = agent
        .analyze(request(middling_factors()))
        .await
        .expect("analysis succeeds");
    assert!(analysis.report.is_empty());
    assert!(matches!(analysis.model_status, ModelStatus::Generated { .. }));
}

#[tokio::test]
async fn cached_analysis_reports_unknown_codes() {
    let (agent, _, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    match agent.cached_analysis("000001.SZ") {
        Err(AnalysisError::NotCached { stock_code }) => assert_eq!(stock_code, "000001.SZ"),
        other => panic!("expected not cached, got {other:?}"),
    }
}

#[tokio::test]
async fn reanalysis_overwrites_cache_entry() {
    let (agent, cache, _) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    agent
        .analyze(request(strong_factors()))
        .await
        .expect("first run");
    agent
        .analyze(request(middling_factors()))
        .await
        .expect("second run");

    assert_eq!(cache.all().len(), 1);
    let cached = agent.cached_analysis("600519.SH").expect("cached");
    assert_eq!(cached.analysis_result.scorecard.total, 29);
}

#[tokio::test]
async fn observation_pool_holds_one_entry_per_code() {
    let (agent, _, pool) = build_agent(Arc::new(ScriptedModel::replying(MODEL_REPLY)));
    let analysis = agent
        .analyze(request(strong_factors()))
        .await
        .expect("analysis succeeds");

    assert!(agent.add_to_observation(&analysis));
    assert!(!agent.add_to_observation(&analysis));

    let entries = pool.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].conclusion, "买入 护城河清晰且估值合理");

    assert!(agent.update_observation("600519.SH", "观望"));
    assert!(!agent.update_observation("000858.SZ", "观望"));
    assert_eq!(agent.observations()[0].conclusion, "观望");

    assert!(agent.remove_observation("600519.SH"));
    assert!(agent.observations().is_empty());
    assert!(agent.clear_observations());
}
