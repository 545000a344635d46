use super::analyst::ConversationTurn;
use crate::market::CompanySnapshot;

/// Turns of history carried into a follow-up prompt.
pub const FOLLOW_UP_HISTORY: usize = 5;

pub const DEEP_ANALYSIS_SYSTEM: &str = "\
你是一个专业的价值投资分析师，精通巴菲特和芒格的投资哲学。
请根据价值投资框架和公司数据，提供深入、专业的投资分析。

## 价值投资框架
- 安全边际：估值分位、PE/PB/PEG 是否提供足够的价格保护
- 基本面：ROE、负债率、营收与利润增速、现金流
- 护城河：品牌、成本、网络效应、转换成本、规模经济
- 风险：财务风险、经营风险、估值风险";

pub const FOLLOW_UP_SYSTEM: &str = "你是一个专业的价值投资分析师，正在回答用户的追问。";

const OUTPUT_CONTRACT: &str = r#"
## 分析要求
1. 基于价值投资框架，提供全面的投资分析
2. 重点分析安全边际、基本面、护城河和风险
3. 提供明确的投资建议（买入/持有/卖出）
4. 给出建议的置信度评分（0-1）
5. 详细阐述分析理由和关键依据
6. 识别主要风险因素并提供应对策略
7. 提供下一步行动建议

## 输出格式
请以JSON格式返回分析结果，包含以下字段：
{
  "analysis_summary": "分析摘要",
  "investment_recommendation": "投资建议（买入/持有/卖出）",
  "confidence_score": 置信度评分（0-1）,
  "risk_assessment": "风险评估（低/中/高）",
  "key_findings": ["关键发现1", "关键发现2", ...],
  "valuation_analysis": {
    "intrinsic_value_estimate": "内在价值估计",
    "safety_margin": "安全边际",
    "valuation_methodology": "估值方法"
  },
  "fundamental_analysis": {
    "financial_health": "财务健康度",
    "growth_prospects": "增长前景",
    "management_quality": "管理层质量"
  },
  "moat_analysis": {
    "moat_type": "护城河类型",
    "moat_strength": "护城河强度",
    "sustainability": "可持续性"
  },
  "risk_analysis": {
    "key_risks": ["风险1", "风险2", ...],
    "risk_mitigation": ["缓解策略1", "缓解策略2", ...]
  },
  "recommendation_reasoning": "建议推理过程",
  "next_steps": ["下一步1", "下一步2", ...]
}"#;

pub fn deep_analysis_prompt(snapshot: &CompanySnapshot, question: Option<&str>) -> String {
    let cash_flow = if snapshot.cash_flow_healthy {
        "健康"
    } else {
        "不健康"
    };
    let mut prompt = format!(
        "## 公司数据\n\
         - 股票代码: {code}\n\
         - 公司名称: {name}\n\
         - 市盈率(PE): {pe}\n\
         - 市净率(PB): {pb}\n\
         - PEG比率: {peg}\n\
         - 市盈率历史分位: {pe_hist}%\n\
         - 市净率历史分位: {pb_hist}%\n\
         - 净资产收益率(ROE): {roe}%\n\
         - 资产负债率: {debt}%\n\
         - 营收增长率: {revenue}%\n\
         - 利润增长率: {profit}%\n\
         - 毛利率: {margin}%\n\
         - 现金流健康度: {cash_flow}\n",
        code = snapshot.code,
        name = snapshot.name,
        pe = snapshot.pe,
        pb = snapshot.pb,
        peg = snapshot.peg,
        pe_hist = snapshot.pe_hist_percent,
        pb_hist = snapshot.pb_hist_percent,
        roe = snapshot.roe_ttm,
        debt = snapshot.debt_to_asset,
        revenue = snapshot.revenue_growth,
        profit = snapshot.profit_growth,
        margin = snapshot.gross_margin,
    );

    if let Some(question) = question.map(str::trim).filter(|q| !q.is_empty()) {
        prompt.push_str(&format!("\n## 用户问题\n{question}\n"));
    }

    prompt.push_str(OUTPUT_CONTRACT);
    prompt
}

/// Only the most recent [`FOLLOW_UP_HISTORY`] turns are included.
pub fn follow_up_prompt(question: &str, history: &[ConversationTurn]) -> String {
    let start = history.len().saturating_sub(FOLLOW_UP_HISTORY);
    let transcript: String = history[start..]
        .iter()
        .map(|turn| format!("{}: {}\n", turn.role.as_str(), turn.content))
        .collect();

    format!(
        "## 对话历史\n{transcript}\n## 最新问题\n{question}\n\n## 回答要求\n\
         1. 基于对话历史和价值投资知识回答问题\n\
         2. 提供详细、专业的分析\n\
         3. 引用相关的价值投资原则\n\
         4. 给出明确的结论和建议\n"
    )
}
