//! Industry knowledge and an evidence-weighted reasoning chain.
//!
//! The chain is reported next to the blended recommendation and never rewrites it.

use serde::Serialize;

use crate::market::CompanySnapshot;

const POSITIVE_ASSESSMENTS: [&str; 5] = ["优秀", "良好", "健康", "低估", "正面"];

/// Keyword to industry, checked in order against the company name.
const INDUSTRY_KEYWORDS: [(&str, &str); 12] = [
    ("茅台", "白酒"),
    ("五粮液", "白酒"),
    ("泸州老窖", "白酒"),
    ("工商", "银行"),
    ("建设", "银行"),
    ("招商", "银行"),
    ("恒瑞", "医药"),
    ("药明", "医药"),
    ("长春", "医药"),
    ("腾讯", "科技"),
    ("阿里", "科技"),
    ("华为", "科技"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryProfile {
    pub name: &'static str,
    pub characteristics: &'static [&'static str],
    pub key_metrics: &'static [&'static str],
    pub risks: &'static [&'static str],
    pub leaders: &'static [&'static str],
    pub growth_prospects: &'static str,
    pub valuation_band: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentLogic {
    pub id: &'static str,
    pub name: &'static str,
    pub premises: &'static [&'static str],
    pub conclusion: &'static str,
    pub confidence: f64,
    pub applicable_industries: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Financial,
    Valuation,
    Growth,
    Profitability,
    Industry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvidenceValue {
    Number(f64),
    Text(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub metric: &'static str,
    pub value: EvidenceValue,
    pub assessment: &'static str,
    pub weight: f64,
}

impl Evidence {
    fn metric(
        kind: EvidenceKind,
        metric: &'static str,
        value: f64,
        assessment: &'static str,
        weight: f64,
    ) -> Self {
        Self {
            kind,
            metric,
            value: EvidenceValue::Number(value),
            assessment,
            weight,
        }
    }

    fn is_positive(&self) -> bool {
        POSITIVE_ASSESSMENTS.contains(&self.assessment)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningChain {
    pub company: String,
    pub industry: Option<&'static str>,
    pub evidence: Vec<Evidence>,
    pub applicable_logics: Vec<InvestmentLogic>,
    pub reasoning_steps: Vec<String>,
    pub conclusion: &'static str,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeInsight {
    pub reasoning_chain: ReasoningChain,
    pub industry_insights: Option<IndustryProfile>,
    pub confidence_enhancement: f64,
    pub knowledge_based_recommendation: &'static str,
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    industries: Vec<IndustryProfile>,
    logics: Vec<InvestmentLogic>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            industries: vec![
                IndustryProfile {
                    name: "白酒",
                    characteristics: &["高毛利率", "强品牌效应", "抗周期性", "社交属性"],
                    key_metrics: &["毛利率", "净利率", "ROE", "品牌价值"],
                    risks: &["政策风险", "消费升级风险", "竞争加剧"],
                    leaders: &["贵州茅台", "五粮液", "泸州老窖"],
                    growth_prospects: "稳定",
                    valuation_band: "PE 15-30",
                },
                IndustryProfile {
                    name: "银行",
                    characteristics: &["高杠杆", "强监管", "周期性", "资产规模效应"],
                    key_metrics: &["ROE", "不良贷款率", "拨备覆盖率", "净息差"],
                    risks: &["信用风险", "利率风险", "监管风险"],
                    leaders: &["工商银行", "建设银行", "招商银行"],
                    growth_prospects: "缓慢",
                    valuation_band: "PB 0.5-1.5",
                },
                IndustryProfile {
                    name: "医药",
                    characteristics: &["研发驱动", "高壁垒", "长周期", "刚需属性"],
                    key_metrics: &["研发投入", "毛利率", "新药管线", "市场份额"],
                    risks: &["研发失败风险", "政策风险", "专利到期风险"],
                    leaders: &["恒瑞医药", "药明康德", "长春高新"],
                    growth_prospects: "良好",
                    valuation_band: "PE 20-40",
                },
                IndustryProfile {
                    name: "科技",
                    characteristics: &["技术迭代快", "高增长", "高风险", "规模效应"],
                    key_metrics: &["研发投入", "营收增长率", "毛利率", "用户增长"],
                    risks: &["技术迭代风险", "竞争风险", "估值风险"],
                    leaders: &["腾讯控股", "阿里巴巴", "华为"],
                    growth_prospects: "高速",
                    valuation_band: "PE 25-50",
                },
            ],
            logics: vec![
                InvestmentLogic {
                    id: "value_investing_basic",
                    name: "价值投资基础逻辑",
                    premises: &[
                        "公司具有持续盈利能力",
                        "当前估值具有安全边际",
                        "公司具有护城河",
                        "管理层诚信且有能力",
                    ],
                    conclusion: "该公司是一个潜在的价值投资标的",
                    confidence: 0.85,
                    applicable_industries: &["白酒", "银行", "医药", "科技"],
                },
                InvestmentLogic {
                    id: "growth_investing",
                    name: "成长投资逻辑",
                    premises: &[
                        "公司营收高速增长",
                        "公司处于成长期行业",
                        "公司具有技术或商业模式优势",
                        "公司管理团队优秀",
                    ],
                    conclusion: "该公司是一个潜在的成长投资标的",
                    confidence: 0.75,
                    applicable_industries: &["科技", "医药"],
                },
                InvestmentLogic {
                    id: "contrarian_investing",
                    name: "逆向投资逻辑",
                    premises: &[
                        "公司当前估值处于历史低位",
                        "公司基本面并未恶化",
                        "市场对公司过度悲观",
                        "公司具有自我修复能力",
                    ],
                    conclusion: "该公司可能存在逆向投资机会",
                    confidence: 0.7,
                    applicable_industries: &["银行", "周期股"],
                },
            ],
        }
    }
}

impl KnowledgeBase {
    pub fn industry(&self, name: &str) -> Option<&IndustryProfile> {
        self.industries.iter().find(|profile| profile.name == name)
    }

    /// Industry for a company, preferring an explicit tag on the snapshot.
    pub fn industry_for(&self, snapshot: &CompanySnapshot) -> Option<&'static str> {
        snapshot
            .industry
            .as_deref()
            .and_then(|tag| self.industry(tag).map(|profile| profile.name))
            .or_else(|| infer_industry(&snapshot.name))
    }

    pub fn reasoning_chain(&self, snapshot: &CompanySnapshot) -> ReasoningChain {
        let industry = self.industry_for(snapshot);
        let evidence = self.collect_evidence(snapshot, industry);
        let applicable_logics: Vec<InvestmentLogic> = self
            .logics
            .iter()
            .filter(|logic| match industry {
                None => true,
                Some(industry) => logic.applicable_industries.contains(&industry),
            })
            .cloned()
            .collect();

        ReasoningChain {
            company: snapshot.name.clone(),
            industry,
            reasoning_steps: reasoning_steps(&evidence, &applicable_logics),
            conclusion: conclusion(&evidence, &applicable_logics),
            confidence: confidence(&evidence, &applicable_logics),
            evidence,
            applicable_logics,
        }
    }

    pub fn insight(&self, snapshot: &CompanySnapshot) -> KnowledgeInsight {
        let reasoning_chain = self.reasoning_chain(snapshot);
        let industry_insights = reasoning_chain
            .industry
            .and_then(|name| self.industry(name))
            .cloned();

        KnowledgeInsight {
            confidence_enhancement: reasoning_chain.confidence,
            knowledge_based_recommendation: reasoning_chain.conclusion,
            industry_insights,
            reasoning_chain,
        }
    }

    fn collect_evidence(&self, snapshot: &CompanySnapshot, industry: Option<&str>) -> Vec<Evidence> {
        use EvidenceKind::*;

        let mut evidence = Vec::new();
        if snapshot.roe_ttm > 15.0 {
            evidence.push(Evidence::metric(Financial, "ROE", snapshot.roe_ttm, "优秀", 0.2));
        }
        if snapshot.pe < 20.0 {
            evidence.push(Evidence::metric(Valuation, "PE", snapshot.pe, "低估", 0.15));
        }
        if snapshot.debt_to_asset < 50.0 {
            evidence.push(Evidence::metric(Financial, "资产负债率", snapshot.debt_to_asset, "健康", 0.15));
        }
        if snapshot.revenue_growth > 8.0 {
            evidence.push(Evidence::metric(Growth, "营收增长率", snapshot.revenue_growth, "良好", 0.15));
        }
        if snapshot.gross_margin > 30.0 {
            evidence.push(Evidence::metric(Profitability, "毛利率", snapshot.gross_margin, "优秀", 0.15));
        }
        if let Some(profile) = industry.and_then(|name| self.industry(name)) {
            let assessment = if matches!(profile.growth_prospects, "良好" | "高速") {
                "正面"
            } else {
                "中性"
            };
            evidence.push(Evidence {
                kind: Industry,
                metric: "行业前景",
                value: EvidenceValue::Text(profile.growth_prospects),
                assessment,
                weight: 0.1,
            });
        }
        if snapshot.pe_hist_percent < 30.0 {
            evidence.push(Evidence::metric(Valuation, "PE历史分位", snapshot.pe_hist_percent, "低估", 0.1));
        }
        evidence
    }
}

pub fn infer_industry(company_name: &str) -> Option<&'static str> {
    INDUSTRY_KEYWORDS
        .iter()
        .find(|(keyword, _)| company_name.contains(keyword))
        .map(|(_, industry)| *industry)
}

fn of_kind<'a>(evidence: &'a [Evidence], kinds: &[EvidenceKind]) -> Vec<&'a Evidence> {
    evidence.iter().filter(|item| kinds.contains(&item.kind)).collect()
}

fn count_assessed(items: &[&Evidence], accepted: &[&str]) -> usize {
    items
        .iter()
        .filter(|item| accepted.contains(&item.assessment))
        .count()
}

fn reasoning_steps(evidence: &[Evidence], logics: &[InvestmentLogic]) -> Vec<String> {
    let mut steps = Vec::new();

    let financial = of_kind(evidence, &[EvidenceKind::Financial]);
    if !financial.is_empty() {
        let good = count_assessed(&financial, &["优秀", "良好", "健康"]);
        steps.push(if good > 0 {
            format!("财务分析：{good}/{}个财务指标表现良好", financial.len())
        } else {
            "财务分析：财务指标表现一般".to_string()
        });
    }

    let valuation = of_kind(evidence, &[EvidenceKind::Valuation]);
    if !valuation.is_empty() {
        let cheap = count_assessed(&valuation, &["低估"]);
        steps.push(if cheap > 0 {
            format!("估值分析：{cheap}/{}个估值指标显示低估", valuation.len())
        } else {
            "估值分析：估值水平一般".to_string()
        });
    }

    let growth = of_kind(evidence, &[EvidenceKind::Growth, EvidenceKind::Industry]);
    if !growth.is_empty() {
        let good = count_assessed(&growth, &["优秀", "良好", "正面"]);
        steps.push(if good > 0 {
            format!("增长分析：{good}/{}个增长指标表现良好", growth.len())
        } else {
            "增长分析：增长潜力一般".to_string()
        });
    }

    if !logics.is_empty() {
        steps.push(format!("应用投资逻辑：{}个投资逻辑适用于该公司", logics.len()));
    }

    steps
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

fn conclusion(evidence: &[Evidence], logics: &[InvestmentLogic]) -> &'static str {
    let positive_ratio = if evidence.is_empty() {
        0.0
    } else {
        evidence.iter().filter(|item| item.is_positive()).count() as f64 / evidence.len() as f64
    };
    let logic_support = mean(logics.iter().map(|logic| logic.confidence));
    let score = positive_ratio * 0.7 + logic_support * 0.3;

    if score >= 0.7 {
        "强烈推荐：该公司符合价值投资标准，具有良好的投资价值"
    } else if score >= 0.5 {
        "谨慎推荐：该公司具有一定投资价值，但存在一些风险因素"
    } else {
        "不推荐：该公司不符合价值投资标准，存在较多风险"
    }
}

fn confidence(evidence: &[Evidence], logics: &[InvestmentLogic]) -> f64 {
    if evidence.is_empty() && logics.is_empty() {
        return 0.3;
    }
    let evidence_confidence = mean(evidence.iter().map(|item| item.weight));
    let logic_confidence = mean(logics.iter().map(|logic| logic.confidence));
    (evidence_confidence * 0.6 + logic_confidence * 0.4).clamp(0.3, 0.95)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: &'static str,
    pub internal_value: f64,
    pub external_value: f64,
    pub diff_percent: f64,
    pub assessment: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossValidation {
    pub matches: Vec<MetricComparison>,
    pub mismatches: Vec<MetricComparison>,
    pub conflicts: Vec<MetricComparison>,
    pub overall_assessment: &'static str,
}

/// Compare two snapshots of the same company metric by metric.
///
/// Metrics where either side is zero are treated as unavailable and skipped, but still
/// count toward the totals used for the overall assessment.
pub fn cross_validate(internal: &CompanySnapshot, external: &CompanySnapshot) -> CrossValidation {
    let metrics: [(&'static str, f64, f64); 5] = [
        ("pe", internal.pe, external.pe),
        ("pb", internal.pb, external.pb),
        ("roe_ttm", internal.roe_ttm, external.roe_ttm),
        ("revenue_growth", internal.revenue_growth, external.revenue_growth),
        ("profit_growth", internal.profit_growth, external.profit_growth),
    ];

    let mut result = CrossValidation::default();
    for (metric, internal_value, external_value) in metrics {
        if internal_value == 0.0 || external_value == 0.0 {
            continue;
        }
        let diff_percent = ((external_value - internal_value) / internal_value).abs() * 100.0;
        let (bucket, assessment) = if diff_percent < 10.0 {
            (&mut result.matches, "一致")
        } else if diff_percent < 30.0 {
            (&mut result.mismatches, "轻微差异")
        } else {
            (&mut result.conflicts, "显著差异")
        };
        bucket.push(MetricComparison {
            metric,
            internal_value,
            external_value,
            diff_percent,
            assessment,
        });
    }

    let total = metrics.len() as f64;
    result.overall_assessment = if result.matches.len() as f64 / total >= 0.7 {
        "数据一致性良好"
    } else if result.conflicts.len() as f64 / total >= 0.3 {
        "数据存在显著冲突"
    } else {
        "数据存在轻微差异"
    };
    result
}
