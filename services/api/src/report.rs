//! Plain-text rendering of analysis results for the command line.

use value_agent::storage::ObservationEntry;
use value_agent::workflows::fundamental::{FundamentalAnalysis, ModelStatus};
use value_agent::workflows::value::{AnalystStatus, DimensionScore, ValueAnalysisReport};

const RULE: &str = "============================================================";

pub(crate) fn banner() -> String {
    format!("{RULE}\n📈 价值投资分析 本地运行\n{RULE}")
}

fn dimension_line(icon: &str, score: &DimensionScore) -> String {
    format!(
        "  {icon} {}: {}分｜{}",
        score.dimension.label(),
        score.score,
        score.label
    )
}

fn bullets<'a>(items: &'a [String], indent: &str) -> impl Iterator<Item = String> + 'a {
    let indent = indent.to_string();
    items.iter().map(move |item| format!("{indent}• {item}"))
}

/// One-company summary, or the full breakdown when `detailed`.
pub(crate) fn render_value_report(report: &ValueAnalysisReport, detailed: bool) -> String {
    let rules = &report.traditional_analysis;
    let deep = &report.deep_analysis;
    let blend = &report.integrated_recommendation;

    let mut lines = vec![
        String::new(),
        format!("【分析】{} ({})", report.company.name, report.company.code),
        format!("综合评分: {}", rules.avg_score),
        format!("结论: {}", rules.decision_label),
    ];

    if !detailed {
        lines.push(format!(
            "🤖 分析师建议: {}",
            deep.investment_recommendation.label()
        ));
        lines.push(format!("综合推荐: {}", blend.label));
        lines.push("---".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push("详细分析:".to_string());
    lines.extend(
        [
            ("🛡️", &rules.safety_margin),
            ("📈", &rules.fundamental),
            ("🏰", &rules.moat),
            ("⚠️ ", &rules.risk),
        ]
        .into_iter()
        .map(|(icon, score)| dimension_line(icon, score)),
    );
    if let Some(guidance) = &rules.safety_margin.guidance {
        lines.push(format!("  安全边际: {}，{}", guidance.margin, guidance.suggestion));
    }

    lines.push(String::new());
    lines.push("  🤖 分析师观点:".to_string());
    lines.push(format!("    建议: {}", deep.investment_recommendation.label()));
    lines.push(format!("    风险: {}", deep.risk_assessment.label()));
    lines.push(format!("    置信度: {:.2}", deep.confidence_score));
    lines.push(format!("    分析: {}", deep.analysis_summary));
    if let AnalystStatus::Fallback { reason } = &report.analyst_status {
        lines.push(format!("    (已使用默认分析: {reason})"));
    }
    lines.extend(bullets(&deep.key_findings, "    "));

    lines.push(String::new());
    lines.push(format!(
        "综合推荐: {} (规则 {} / 分析师 {} → {:.1})",
        blend.label, blend.rule_level, blend.llm_level, blend.blended
    ));

    let chain = &report.knowledge.reasoning_chain;
    lines.push(format!(
        "知识推理: {} (置信度 {:.2})",
        chain.conclusion, chain.confidence
    ));
    lines.extend(chain.reasoning_steps.iter().map(|step| format!("  - {step}")));

    if let Some(validation) = &report.cross_validation {
        lines.push(format!("数据交叉验证: {}", validation.overall_assessment));
    }

    if !rules.all_warnings.is_empty() {
        lines.push(String::new());
        lines.push("  风险警告:".to_string());
        lines.extend(bullets(&rules.all_warnings, "    "));
    }
    lines.push("---".to_string());
    lines.join("\n")
}

pub(crate) fn render_fundamental(analysis: &FundamentalAnalysis) -> String {
    let name = if analysis.company_name.is_empty() {
        analysis.stock_code.as_str()
    } else {
        analysis.company_name.as_str()
    };
    let report = &analysis.report;

    let mut lines = vec![
        String::new(),
        format!("【基本面分析】{name} ({})", analysis.stock_code),
        format!("排雷: {}", analysis.minefield.message),
        format!(
            "因子评分: {} (总分 {}，平均 {:.2})",
            analysis.scorecard.grade.label(),
            analysis.scorecard.total,
            analysis.scorecard.average
        ),
    ];
    if let ModelStatus::Fallback { reason } = &analysis.model_status {
        lines.push(format!("(模型不可用，使用量化报告: {reason})"));
    }

    lines.push(String::new());
    lines.push(format!("【决策结论】{}", report.conclusion));
    lines.push("【关键事实】".to_string());
    lines.extend(bullets(&report.key_facts, "  "));
    lines.push(format!("【推理逻辑】{}", report.reasoning));
    lines.push("【风险提示】".to_string());
    if report.risks.is_empty() {
        lines.push("  无".to_string());
    }
    lines.extend(bullets(&report.risks, "  "));
    lines.join("\n")
}

pub(crate) fn render_pool(entries: &[ObservationEntry]) -> String {
    if entries.is_empty() {
        return "观察池为空".to_string();
    }
    let rows = entries.iter().map(|entry| {
        format!(
            "  {} {} | {} | {}",
            entry.code,
            entry.name,
            entry.conclusion,
            entry.timestamp.format("%Y-%m-%d %H:%M")
        )
    });
    std::iter::once(format!("观察池 ({} 只)", entries.len()))
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}
