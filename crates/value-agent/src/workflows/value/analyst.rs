//! Deep qualitative analysis behind the [`InvestmentAnalyst`] seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::{deep_analysis_prompt, follow_up_prompt, DEEP_ANALYSIS_SYSTEM, FOLLOW_UP_SYSTEM};
use crate::config::LlmConfig;
use crate::llm::{extract_json_object, generate_with_deadline, ChatRequest, LanguageModel, LlmError};
use crate::market::CompanySnapshot;

const RELATED_TOPICS: [&str; 3] = ["价值投资原则", "投资分析方法", "风险管理策略"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "买入")]
    Buy,
    #[serde(rename = "持有")]
    Hold,
    #[serde(rename = "卖出")]
    Sell,
    #[serde(rename = "中性")]
    Neutral,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Buy => "买入",
            Recommendation::Hold => "持有",
            Recommendation::Sell => "卖出",
            Recommendation::Neutral => "中性",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "买入" | "buy" => Some(Recommendation::Buy),
            "持有" | "hold" => Some(Recommendation::Hold),
            "卖出" | "sell" => Some(Recommendation::Sell),
            "中性" | "neutral" => Some(Recommendation::Neutral),
            _ => None,
        }
    }

    /// Opposite reading when the advice is negated: "不建议买入" is not a buy.
    fn negated(self) -> Self {
        match self {
            Recommendation::Buy | Recommendation::Neutral => Recommendation::Neutral,
            Recommendation::Hold => Recommendation::Sell,
            Recommendation::Sell => Recommendation::Hold,
        }
    }

    /// Lenient reading of free-form model output.
    ///
    /// Exact labels win. Otherwise the first keyword whose clause carries no negation
    /// decides; when every keyword is negated, the first one is read in reverse.
    pub fn from_text(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        if let Some(exact) = Self::from_label(&normalized) {
            return exact;
        }

        let mut mentions: Vec<(usize, Recommendation)> = RECOMMENDATION_KEYWORDS
            .iter()
            .flat_map(|(keyword, recommendation)| {
                normalized
                    .match_indices(keyword)
                    .map(move |(at, _)| (at, *recommendation))
            })
            .collect();
        mentions.sort_by_key(|(at, _)| *at);

        let negated_at = |at: usize| {
            let before = &normalized[..at];
            let clause = before
                .rfind(&CLAUSE_BREAKS[..])
                .map_or(before, |brk| &before[brk..]);
            NEGATIONS.iter().any(|negation| clause.contains(negation))
        };

        mentions
            .iter()
            .find(|(at, _)| !negated_at(*at))
            .map(|(_, recommendation)| *recommendation)
            .or_else(|| mentions.first().map(|(_, recommendation)| recommendation.negated()))
            .unwrap_or(Recommendation::Neutral)
    }
}

const RECOMMENDATION_KEYWORDS: [(&str, Recommendation); 8] = [
    ("买入", Recommendation::Buy),
    ("持有", Recommendation::Hold),
    ("卖出", Recommendation::Sell),
    ("中性", Recommendation::Neutral),
    ("buy", Recommendation::Buy),
    ("hold", Recommendation::Hold),
    ("sell", Recommendation::Sell),
    ("neutral", Recommendation::Neutral),
];

const NEGATIONS: [&str; 7] = ["不建议", "不宜", "不要", "不应", "避免", "not ", "don't "];

const CLAUSE_BREAKS: [char; 8] = ['，', '。', '；', ',', ';', '.', '!', '！'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "低")]
    Low,
    #[serde(rename = "中", alias = "中等")]
    Medium,
    #[serde(rename = "高")]
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "低",
            RiskLevel::Medium => "中",
            RiskLevel::High => "高",
        }
    }

    fn from_text(text: &str) -> Self {
        if text.contains('高') {
            RiskLevel::High
        } else if text.contains('低') {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationSection {
    pub intrinsic_value_estimate: String,
    pub safety_margin: String,
    pub valuation_methodology: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalSection {
    pub financial_health: String,
    pub growth_prospects: String,
    pub management_quality: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoatSection {
    pub moat_type: String,
    pub moat_strength: String,
    pub sustainability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub key_risks: Vec<String>,
    pub risk_mitigation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub analysis_summary: String,
    pub investment_recommendation: Recommendation,
    pub confidence_score: f64,
    pub risk_assessment: RiskLevel,
    pub key_findings: Vec<String>,
    pub valuation_analysis: ValuationSection,
    pub fundamental_analysis: FundamentalSection,
    pub moat_analysis: MoatSection,
    pub risk_analysis: RiskSection,
    pub recommendation_reasoning: String,
    pub next_steps: Vec<String>,
}

impl DeepAnalysis {
    /// Substituted whenever the analyst cannot produce a usable result.
    pub fn neutral_default() -> Self {
        Self {
            analysis_summary: "大模型分析失败，使用默认分析".to_string(),
            investment_recommendation: Recommendation::Neutral,
            confidence_score: 0.5,
            risk_assessment: RiskLevel::Medium,
            key_findings: vec!["分析失败，无法提供详细信息".to_string()],
            valuation_analysis: ValuationSection::default(),
            fundamental_analysis: FundamentalSection::default(),
            moat_analysis: MoatSection::default(),
            risk_analysis: RiskSection::default(),
            recommendation_reasoning: "分析失败，无法提供推理过程".to_string(),
            next_steps: vec!["请检查网络连接后重试".to_string()],
        }
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Shape accepted from a model reply; every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelReply {
    analysis_summary: String,
    investment_recommendation: String,
    confidence_score: Option<f64>,
    risk_assessment: String,
    key_findings: Vec<String>,
    valuation_analysis: ValuationSection,
    fundamental_analysis: FundamentalSection,
    moat_analysis: MoatSection,
    risk_analysis: RiskSection,
    recommendation_reasoning: String,
    next_steps: Vec<String>,
}

impl From<ModelReply> for DeepAnalysis {
    fn from(reply: ModelReply) -> Self {
        Self {
            analysis_summary: reply.analysis_summary,
            investment_recommendation: Recommendation::from_text(&reply.investment_recommendation),
            confidence_score: clamp_confidence(reply.confidence_score.unwrap_or(0.5)),
            risk_assessment: RiskLevel::from_text(&reply.risk_assessment),
            key_findings: reply.key_findings,
            valuation_analysis: reply.valuation_analysis,
            fundamental_analysis: reply.fundamental_analysis,
            moat_analysis: reply.moat_analysis,
            risk_analysis: reply.risk_analysis,
            recommendation_reasoning: reply.recommendation_reasoning,
            next_steps: reply.next_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpAnswer {
    pub answer: String,
    pub confidence: f64,
    pub related_topics: Vec<String>,
}

impl FollowUpAnswer {
    pub fn fallback() -> Self {
        Self {
            answer: "追问失败，无法提供回答".to_string(),
            confidence: 0.5,
            related_topics: vec!["追问失败".to_string()],
        }
    }

    fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            confidence: 0.8,
            related_topics: RELATED_TOPICS.iter().map(|topic| topic.to_string()).collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalystError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error("analyst reply could not be parsed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait InvestmentAnalyst: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(
        &self,
        snapshot: &CompanySnapshot,
        question: Option<&str>,
    ) -> Result<DeepAnalysis, AnalystError>;

    async fn follow_up(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<FollowUpAnswer, AnalystError>;
}

/// Analyst backed by a chat model that answers with a JSON object.
pub struct ModelAnalyst {
    model: Arc<dyn LanguageModel>,
    llm: LlmConfig,
}

impl ModelAnalyst {
    pub fn new(model: Arc<dyn LanguageModel>, llm: LlmConfig) -> Self {
        Self { model, llm }
    }
}

#[async_trait]
impl InvestmentAnalyst for ModelAnalyst {
    fn name(&self) -> &'static str {
        self.model.name()
    }

    async fn analyze(
        &self,
        snapshot: &CompanySnapshot,
        question: Option<&str>,
    ) -> Result<DeepAnalysis, AnalystError> {
        let request = ChatRequest::new(
            &self.llm,
            DEEP_ANALYSIS_SYSTEM,
            deep_analysis_prompt(snapshot, question),
        );
        let text = generate_with_deadline(self.model.as_ref(), &request).await?;
        let json = extract_json_object(&text)
            .ok_or_else(|| AnalystError::Parse("no JSON object in reply".to_string()))?;
        let reply: ModelReply =
            serde_json::from_str(json).map_err(|err| AnalystError::Parse(err.to_string()))?;
        Ok(reply.into())
    }

    async fn follow_up(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<FollowUpAnswer, AnalystError> {
        let request = ChatRequest::new(&self.llm, FOLLOW_UP_SYSTEM, follow_up_prompt(question, history));
        let text = generate_with_deadline(self.model.as_ref(), &request).await?;
        let answer = text.trim();
        if answer.is_empty() {
            return Err(AnalystError::Parse("empty answer".to_string()));
        }
        Ok(FollowUpAnswer::answered(answer))
    }
}

/// Deterministic offline analyst driven by fixed metric thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyst;

impl HeuristicAnalyst {
    fn score(snapshot: &CompanySnapshot) -> u32 {
        let weights: [(bool, u32); 7] = [
            (snapshot.pe < 20.0, 20),
            (snapshot.pb < 3.0, 20),
            (snapshot.roe_ttm > 15.0, 20),
            (snapshot.debt_to_asset < 50.0, 15),
            (snapshot.revenue_growth > 8.0, 10),
            (snapshot.profit_growth > 5.0, 10),
            (snapshot.gross_margin > 30.0, 5),
        ];
        weights
            .into_iter()
            .filter_map(|(holds, points)| holds.then_some(points))
            .sum()
    }

    fn findings(s: &CompanySnapshot) -> Vec<String> {
        let mut findings = Vec::new();
        if s.roe_ttm > 15.0 {
            findings.push(format!("ROE优秀({}%)，表明公司盈利能力强", s.roe_ttm));
        }
        if s.pe < 20.0 {
            findings.push(format!("市盈率合理({})，估值相对便宜", s.pe));
        }
        if s.debt_to_asset < 50.0 {
            findings.push(format!("资产负债率健康({}%)，财务风险低", s.debt_to_asset));
        }
        if s.revenue_growth > 8.0 {
            findings.push(format!("营收增长良好({}%)，业务扩张顺利", s.revenue_growth));
        }
        if s.profit_growth > 5.0 {
            findings.push(format!("利润增长稳定({}%)，盈利能力持续", s.profit_growth));
        }
        if s.gross_margin > 30.0 {
            findings.push(format!("毛利率较高({}%)，产品具有一定定价权", s.gross_margin));
        }
        if findings.is_empty() {
            findings.push("未发现明显优势".to_string());
        }
        findings
    }

    fn risks(s: &CompanySnapshot) -> RiskSection {
        let checks = [
            (s.pe > 30.0, "估值过高，存在回调风险", "等待估值回归合理区间"),
            (s.debt_to_asset > 60.0, "资产负债率过高，财务风险较大", "关注债务结构和偿债能力"),
            (s.profit_growth < 0.0, "利润负增长，盈利能力下降", "分析利润下滑原因，评估持续性"),
            (s.revenue_growth < 0.0, "营收负增长，业务可能面临困境", "关注行业趋势和公司战略调整"),
        ];
        let mut section = RiskSection::default();
        for (holds, risk, mitigation) in checks {
            if holds {
                section.key_risks.push(risk.to_string());
                section.risk_mitigation.push(mitigation.to_string());
            }
        }
        if section.key_risks.is_empty() {
            section.key_risks.push("未发现重大风险".to_string());
            section.risk_mitigation.push("保持密切关注".to_string());
        }
        section
    }

    /// Leading finding that acknowledges what the question focuses on.
    fn question_focus(question: &str) -> Option<&'static str> {
        let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| question.contains(keyword));
        if mentions(&["安全边际", "估值"]) {
            Some("用户关注安全边际分析，已重点评估")
        } else if mentions(&["护城河", "竞争优势"]) {
            Some("用户关注护城河分析，已重点评估竞争优势")
        } else if mentions(&["风险", "隐患"]) {
            Some("用户关注风险分析，已重点评估潜在风险")
        } else if mentions(&["管理层", "管理"]) {
            Some("用户关注管理层分析，已重点评估管理质量")
        } else {
            None
        }
    }

    fn answer_for(question: &str) -> &'static str {
        if question.contains("安全边际") {
            "安全边际是价值投资的核心原则之一，它代表了内在价值与市场价格之间的差距。计算安全边际的方法包括：1) DCF模型计算内在价值，2) 相对估值法对比历史和行业水平，3) 考虑最坏情景下的价值。一般来说，安全边际大于30%被认为是较高的，15-30%为中等，低于15%为较低。"
        } else if question.contains("护城河") {
            "护城河是公司长期保持竞争优势的能力，主要包括：1) 品牌护城河（如茅台、苹果），2) 成本优势护城河（如沃尔玛、亚马逊），3) 网络效应护城河（如Facebook、微信），4) 转换成本护城河（如企业软件），5) 规模经济护城河。评估护城河强度需要分析ROE持续性、毛利率水平、市场份额稳定性等指标。"
        } else if question.contains("DCF") || question.contains("内在价值") {
            "DCF（自由现金流贴现）模型是估计内在价值的重要方法，它通过预测未来自由现金流并折现到现在来计算公司价值。关键参数包括：1) 自由现金流预测，2) 贴现率选择（通常使用WACC），3) 增长率假设，4) 预测期长度。DCF模型的局限性在于对参数非常敏感，因此建议结合多种估值方法使用。"
        } else if question.contains("风险") {
            "投资风险主要包括：1) 财务风险（如债务过高、现金流恶化），2) 经营风险（如业务模式变化、竞争加剧），3) 管理层风险（如能力不足、诚信问题），4) 行业风险（如技术迭代、监管变化），5) 宏观风险（如经济衰退、利率上升）。风险管理策略包括分散投资、仓位控制、止损机制和定期重估。"
        } else if question.contains("管理层") {
            "管理层质量是价值投资的重要考量因素，评估维度包括：1) 诚信度（信息披露质量、历史行为），2) 能力（战略规划、执行能力、资本配置），3) 利益一致性（持股比例、薪酬结构），4) 企业文化（长期导向、创新能力）。可以通过阅读年报、股东大会记录、管理层访谈等方式评估。"
        } else {
            "作为价值投资分析师，我建议你关注以下核心要素：1) 安全边际（内在价值与价格的差距），2) 基本面（财务健康度、增长前景），3) 护城河（竞争优势的持续性），4) 风险（多维度风险评估）。投资决策应该基于深入的研究和理性的分析，而非市场情绪。"
        }
    }

    pub fn assess(snapshot: &CompanySnapshot, question: Option<&str>) -> DeepAnalysis {
        let s = snapshot;
        let score = Self::score(s);
        let (recommendation, confidence, risk, margin, basis) = match score {
            80.. => (Recommendation::Buy, 0.85, RiskLevel::Low, "高", "高ROE、合理估值和健康财务状况"),
            60..=79 => (Recommendation::Hold, 0.65, RiskLevel::Medium, "中", "良好基本面和中等估值"),
            _ => (Recommendation::Sell, 0.7, RiskLevel::High, "低", "估值过高或基本面存在问题"),
        };

        let financial_health = if s.debt_to_asset < 50.0 && s.roe_ttm > 15.0 {
            "优秀"
        } else if s.debt_to_asset < 60.0 && s.roe_ttm > 10.0 {
            "良好"
        } else {
            "一般"
        };
        let growth_prospects = if s.revenue_growth > 8.0 && s.profit_growth > 5.0 {
            "良好"
        } else if s.revenue_growth > 0.0 {
            "一般"
        } else {
            "谨慎"
        };
        let moat_strength = if s.roe_ttm > 20.0 && s.gross_margin > 40.0 {
            "强"
        } else if s.roe_ttm > 15.0 && s.gross_margin > 30.0 {
            "中等"
        } else {
            "弱"
        };

        let mut key_findings = Self::findings(s);
        if let Some(focus) = question.and_then(Self::question_focus) {
            key_findings.insert(0, focus.to_string());
        }

        DeepAnalysis {
            analysis_summary: format!(
                "{}的投资分析：基于价值投资原则，综合评估公司的安全边际、基本面、护城河和风险。",
                s.name
            ),
            investment_recommendation: recommendation,
            confidence_score: confidence,
            risk_assessment: risk,
            key_findings,
            valuation_analysis: ValuationSection {
                intrinsic_value_estimate: "基于DCF模型和相对估值法，内在价值估计为合理水平".to_string(),
                safety_margin: format!("安全边际评估为{margin}"),
                valuation_methodology: "DCF模型、相对估值法、历史估值对比".to_string(),
            },
            fundamental_analysis: FundamentalSection {
                financial_health: format!("财务健康度{financial_health}"),
                growth_prospects: format!("增长前景{growth_prospects}"),
                management_quality: "基于公开信息，管理层质量良好".to_string(),
            },
            moat_analysis: MoatSection {
                moat_type: "基于高ROE和毛利率，具有一定的护城河".to_string(),
                moat_strength: format!("护城河强度{moat_strength}"),
                sustainability: "护城河具有一定的可持续性".to_string(),
            },
            risk_analysis: Self::risks(s),
            recommendation_reasoning: format!("基于公司的{basis}，建议{}。", recommendation.label()),
            next_steps: [
                "持续跟踪公司季度财报",
                "关注行业竞争格局变化",
                "评估管理层战略执行情况",
                "根据市场变化调整投资策略",
            ]
            .iter()
            .map(|step| step.to_string())
            .collect(),
        }
    }
}

#[async_trait]
impl InvestmentAnalyst for HeuristicAnalyst {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(
        &self,
        snapshot: &CompanySnapshot,
        question: Option<&str>,
    ) -> Result<DeepAnalysis, AnalystError> {
        Ok(Self::assess(snapshot, question))
    }

    async fn follow_up(
        &self,
        question: &str,
        _history: &[ConversationTurn],
    ) -> Result<FollowUpAnswer, AnalystError> {
        Ok(FollowUpAnswer::answered(Self::answer_for(question)))
    }
}

/// The model-backed analyst when an API key is configured, the heuristic one otherwise.
pub fn analyst_from_config(
    model: Arc<dyn LanguageModel>,
    llm: &LlmConfig,
) -> Arc<dyn InvestmentAnalyst> {
    if llm.api_key.is_some() {
        Arc::new(ModelAnalyst::new(model, llm.clone()))
    } else {
        Arc::new(HeuristicAnalyst)
    }
}
