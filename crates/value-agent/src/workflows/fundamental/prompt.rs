use super::domain::{BusinessRecord, FactorKey, FactorRecord};
use super::minefield::MinefieldOutcome;
use super::scoring::FactorScorecard;

/// Persona and output contract shared by every fundamental analysis call.
pub const ANALYST_PERSONA: &str = "\
你是一位严格遵循巴菲特投资理念的基本面分析专家，专注于长期价值投资。

# 核心原则
1. **数据至上**：基于真实、可验证的数据进行分析，禁止编造任何信息
2. **长期视角**：关注企业的长期竞争力，不做短期预测，不进行技术分析
3. **安全边际**：重视企业的财务健康状况和内在价值
4. **能力圈**：只对理解的商业模式发表意见
5. **确定性**：追求高确定性的投资机会，规避高风险企业

# 分析范围（仅做定性推理）
- 商业模式：企业如何赚钱，是否可持续
- 护城河：企业的竞争优势，是否难以复制
- 管理层质量：管理层的诚信、能力和资本配置能力
- 逻辑权衡：各因素之间的权重和平衡
- 风险解释：潜在风险的识别和分析

# 禁止项
- 禁止编造数据或事实
- 禁止进行技术分析（如K线、趋势等）
- 禁止做出短期股价预测
- 禁止推荐高风险投资策略

# 输入数据
1. **量化因子**：ROE、毛利率、净现比、资产负债率、PE/PB、营收/利润增速、股息率、现金流质量
2. **业务数据**：业务核心、连续亏损年数、现金流恶化年数、是否高质押
3. **排雷结果**：是否通过硬排雷规则
4. **因子评分**：各因子的评分和总体等级

# 输出格式（必须严格遵守）
【决策结论】买入/观望/不碰 + 一句话理由
【关键事实】≤5条量化因子+业务核心（真实、可验证）
【推理逻辑】巴菲特风格，量化规则+定性逻辑，可解释、不玄学
【风险提示】≤3条核心风险

# 决策标准
- **买入**：财务健康、商业模式清晰、护城河明显、管理层优秀、估值合理
- **观望**：部分指标达标，但存在一定不确定性或估值偏高
- **不碰**：财务风险高、商业模式有问题、护城河弱、管理层可疑

请基于以上原则和数据，给出客观、理性的分析结论。
";

const PERCENT_FACTORS: [FactorKey; 6] = [
    FactorKey::Roe,
    FactorKey::GrossMargin,
    FactorKey::DebtRatio,
    FactorKey::RevenueGrowth,
    FactorKey::ProfitGrowth,
    FactorKey::DividendYield,
];

/// Data section sent as the user turn.
pub fn analysis_prompt(
    factors: &FactorRecord,
    business: &BusinessRecord,
    minefield: &MinefieldOutcome,
    scorecard: &FactorScorecard,
) -> String {
    let factor_lines: String = FactorKey::ALL
        .iter()
        .map(|key| {
            let suffix = if PERCENT_FACTORS.contains(key) { "%" } else { "" };
            format!("{}: {}{}\n", key.label(), factors.get(*key), suffix)
        })
        .collect();

    let core = if business.business_core.trim().is_empty() {
        "未知"
    } else {
        business.business_core.trim()
    };
    let mut prompt = format!("# 量化因子数据\n{factor_lines}");
    prompt.push_str(&format!(
        "\n# 业务数据\n业务核心: {core}\n连续亏损年数: {}\n现金流恶化年数: {}\n是否高质押: {}\n",
        business.loss_years,
        business.cash_flow_deterioration_years,
        if business.high_pledge { "是" } else { "否" },
    ));

    prompt.push_str(&format!(
        "\n# 排雷结果\n{}\n\n# 因子评分\n总体等级: {}\n总评分: {}\n平均评分: {:.2}\n\n请根据以上数据，按照要求的格式输出分析结果。\n",
        minefield.message,
        scorecard.grade.label(),
        scorecard.total,
        scorecard.average,
    ));

    prompt
}
