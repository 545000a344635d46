use serde::{Deserialize, Serialize};

use super::minefield::MinefieldOutcome;
use super::scoring::{FactorGrade, FactorScorecard};

const CONCLUSION_HEADER: &str = "【决策结论】";
const KEY_FACTS_HEADER: &str = "【关键事实】";
const REASONING_HEADER: &str = "【推理逻辑】";
const RISKS_HEADER: &str = "【风险提示】";

/// Four-section report extracted from model text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedReport {
    pub conclusion: String,
    pub key_facts: Vec<String>,
    pub reasoning: String,
    pub risks: Vec<String>,
}

impl FormattedReport {
    pub fn is_empty(&self) -> bool {
        self.conclusion.is_empty()
            && self.key_facts.is_empty()
            && self.reasoning.is_empty()
            && self.risks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Conclusion,
    KeyFacts,
    Reasoning,
    Risks,
}

/// Split model output into sections. Text without headers yields an empty report.
pub fn format_report(text: &str, max_key_facts: usize, max_risks: usize) -> FormattedReport {
    let mut report = FormattedReport::default();
    let mut section = Section::None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(rest) = line.strip_prefix(CONCLUSION_HEADER) {
            section = Section::Conclusion;
            report.conclusion = rest.trim().to_string();
        } else if line.starts_with(KEY_FACTS_HEADER) {
            section = Section::KeyFacts;
        } else if let Some(rest) = line.strip_prefix(REASONING_HEADER) {
            section = Section::Reasoning;
            report.reasoning = rest.trim().to_string();
        } else if line.starts_with(RISKS_HEADER) {
            section = Section::Risks;
        } else {
            match section {
                Section::KeyFacts => report.key_facts.push(line.to_string()),
                Section::Reasoning => {
                    if !report.reasoning.is_empty() {
                        report.reasoning.push(' ');
                    }
                    report.reasoning.push_str(line);
                }
                Section::Risks => report.risks.push(line.to_string()),
                Section::Conclusion | Section::None => {}
            }
        }
    }

    report.key_facts.truncate(max_key_facts);
    report.risks.truncate(max_risks);
    report
}

/// Report assembled from the quantitative results alone, used when the model is unreachable.
pub fn quantitative_report(
    minefield: &MinefieldOutcome,
    scorecard: &FactorScorecard,
    key_facts: Vec<String>,
) -> FormattedReport {
    let conclusion = if !minefield.passed {
        format!("不碰 {}", minefield.message)
    } else if scorecard.grade == FactorGrade::Excellent {
        format!("买入 因子评分{}，财务指标全面达标", scorecard.grade.label())
    } else {
        format!("观望 因子评分{}，部分指标仍需验证", scorecard.grade.label())
    };

    let reasoning = format!(
        "{}；九项因子总评分 {}，平均 {:.2}，等级{}。",
        minefield.message,
        scorecard.total,
        scorecard.average,
        scorecard.grade.label()
    );

    let risks = if minefield.passed {
        Vec::new()
    } else {
        vec![minefield.message.clone()]
    };

    FormattedReport {
        conclusion,
        key_facts,
        reasoning,
        risks,
    }
}
