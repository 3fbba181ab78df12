// ==========================================
// 智能膳食订餐系统 - 因子接口与管道
// ==========================================
// 职责: 定义 SelectionFactor trait 并按注册顺序执行
// 说明: 启用/权重来自配置表, 因子本身不感知配置
// ==========================================

use crate::config::{FactorSettings, OrderingConfig};
use crate::domain::outcome::{FactorEvaluationResult, ScoredRecipe, SelectionContext};
use crate::domain::recipe::Recipe;
use crate::domain::types::ReviewReason;
use crate::engine::factors::calorie_constraint::CalorieConstraintFactor;
use crate::engine::factors::stubs::{
    AllergySafetyFactor, ReligiousDietaryFactor, TextureModificationFactor,
};
use tracing::debug;

// ==========================================
// SelectionFactor Trait
// ==========================================
/// 选餐因子的统一能力集
///
/// 三个能力固定: 过滤候选池 / 为单菜品评分 / 判断是否要求
/// 人工复核。因子只表达业务规则, 启用状态与权重由管道按
/// 配置表控制。
pub trait SelectionFactor: Send + Sync {
    /// 因子标识 (SCREAMING_SNAKE, 进入运行记录)
    fn name(&self) -> &'static str;

    /// 过滤候选池
    ///
    /// # 红线
    /// - 只许收窄, 不许加入新菜品
    fn filter(&self, recipes: Vec<Recipe>, context: &SelectionContext) -> Vec<Recipe>;

    /// 单菜品评分 (0..=100, 越高越优)
    fn score(&self, recipe: &Recipe, context: &SelectionContext) -> i32;

    /// 本次上下文是否要求人工复核
    fn requires_review(&self, context: &SelectionContext) -> bool;

    /// 因子对应的复核原因
    fn review_reason(&self) -> ReviewReason;
}

// ==========================================
// SelectionFactorPipeline - 因子管道
// ==========================================
struct FactorEntry {
    factor: Box<dyn SelectionFactor>,
    settings: FactorSettings,
}

/// 管道单次执行的产出
///
/// 过滤后的带分候选 + 每因子一条执行记录 + 复核原因集合
#[derive(Debug)]
pub struct FactorPipelineEvaluation {
    pub scored: Vec<ScoredRecipe>,
    pub factor_results: Vec<FactorEvaluationResult>,
    pub review_reasons: Vec<ReviewReason>,
    pub applied_factors: Vec<String>,
}

pub struct SelectionFactorPipeline {
    entries: Vec<FactorEntry>,
}

impl SelectionFactorPipeline {
    /// 按固定优先级装配因子注册表
    ///
    /// 注册顺序即执行顺序: 过敏安全 → 质地调整 → 热量约束 →
    /// 宗教饮食。新因子必须插进这个顺序里, 不得动态追加。
    pub fn from_config(config: &OrderingConfig) -> Self {
        let table = &config.selection_factors;
        let entries = vec![
            FactorEntry {
                factor: Box::new(AllergySafetyFactor),
                settings: table.allergy_safety,
            },
            FactorEntry {
                factor: Box::new(TextureModificationFactor),
                settings: table.texture_modification,
            },
            FactorEntry {
                factor: Box::new(CalorieConstraintFactor::new(config.category_target_shares)),
                settings: table.calorie_constraint,
            },
            FactorEntry {
                factor: Box::new(ReligiousDietaryFactor),
                settings: table.religious_dietary,
            },
        ];
        Self { entries }
    }

    /// 管道单次执行: 逐因子过滤 (连续收窄) + 复核信号聚合 +
    /// 幸存菜品加权评分
    pub fn evaluate(
        &self,
        catalog: Vec<Recipe>,
        context: &SelectionContext,
    ) -> FactorPipelineEvaluation {
        let mut pool = catalog;
        let mut factor_results = Vec::new();
        let mut review_reasons: Vec<ReviewReason> = Vec::new();
        let mut applied_factors = Vec::new();

        for entry in &self.entries {
            let factor = entry.factor.as_ref();

            if !entry.settings.enabled {
                // 红线: 停用因子 = 数据缺失, 必须报复核
                factor_results.push(FactorEvaluationResult {
                    factor_name: factor.name().to_string(),
                    applied: false,
                    reason: "Factor disabled".to_string(),
                    flag_for_review: true,
                });
                push_unique(&mut review_reasons, factor.review_reason());
                continue;
            }

            let before = pool.len();
            pool = factor.filter(pool, context);
            let flagged = factor.requires_review(context);

            factor_results.push(FactorEvaluationResult {
                factor_name: factor.name().to_string(),
                applied: true,
                reason: format!("Filtered from {} to {} recipes", before, pool.len()),
                flag_for_review: flagged,
            });
            applied_factors.push(factor.name().to_string());
            if flagged {
                push_unique(&mut review_reasons, factor.review_reason());
            }
        }

        let scored: Vec<ScoredRecipe> = pool
            .into_iter()
            .map(|recipe| {
                let score = self.weighted_score(&recipe, context);
                ScoredRecipe { recipe, score }
            })
            .collect();

        debug!(
            patient_id = %context.patient_id,
            occasion = %context.meal_occasion,
            survivors = scored.len(),
            review_reasons = review_reasons.len(),
            "因子管道执行完成"
        );

        FactorPipelineEvaluation {
            scored,
            factor_results,
            review_reasons,
            applied_factors,
        }
    }

    /// 加权总分 = Σ score × weight / 100 (仅启用因子)
    fn weighted_score(&self, recipe: &Recipe, context: &SelectionContext) -> i32 {
        self.entries
            .iter()
            .filter(|entry| entry.settings.enabled)
            .map(|entry| entry.factor.score(recipe, context) * entry.settings.weight / 100)
            .sum()
    }
}

/// 保序去重追加
fn push_unique(reasons: &mut Vec<ReviewReason>, reason: ReviewReason) {
    if !reasons.contains(&reason) {
        reasons.push(reason);
    }
}
