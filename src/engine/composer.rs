// ==========================================
// 智能膳食订餐系统 - 组餐引擎
// ==========================================
// 职责: 在热量预算内跨四类菜品贪心组餐
// 阶段: 主菜 → 配菜 → 饮品 → 甜点, 顺序固定, 跨阶段不回溯
// 红线: 无主菜立即判失败; 失败的组餐不得保留任何菜品
// ==========================================

use crate::config::OrderingConfig;
use crate::domain::outcome::{CalorieRange, ComposedMeal, FactorEvaluationResult, ScoredRecipe};
use crate::domain::recipe::Recipe;
use crate::domain::types::RecipeCategory;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// MealComposer - 组餐引擎
// ==========================================
pub struct MealComposer {
    config: Arc<OrderingConfig>,
}

impl MealComposer {
    /// 创建新的 MealComposer 实例
    pub fn new(config: Arc<OrderingConfig>) -> Self {
        Self { config }
    }

    /// 四阶段贪心组餐
    ///
    /// # 规则
    /// 1. 主菜: 预算 = 上限 × entree_budget_share; 选不出主菜
    ///    则整餐立即失败
    /// 2. 配菜: 预算 = 剩余 − side_stage_reserve (给饮品+甜点留量)
    /// 3. 饮品: 预算 = 剩余 − beverage_stage_reserve (给甜点留量)
    /// 4. 甜点: 预算 = 全部剩余
    ///
    /// 各阶段内候选按分数降序逐个尝试, 放不下就跳过, 不为
    /// 低分但更合身的候选回头; 入选即扣减本阶段预算。
    /// 成功 = 含主菜 且 总热量落在 [下限, 上限] 内。
    ///
    /// # 参数
    /// - scored: 因子管道过滤评分后的候选 (各类别混在一起)
    /// - range: 单餐热量区间
    /// - factor_results: 管道执行记录 (嵌入组餐结果)
    pub fn compose(
        &self,
        scored: Vec<ScoredRecipe>,
        range: &CalorieRange,
        factor_results: Vec<FactorEvaluationResult>,
    ) -> ComposedMeal {
        let mut pools = split_by_category(scored);
        let rules = &self.config.composition_rules;
        let maximum = range.maximum;

        let mut selected: Vec<Recipe> = Vec::new();
        let mut total: i32 = 0;

        // === 阶段 1: 主菜 ===
        let entree_budget = f64::from(maximum) * self.config.entree_budget_share;
        let entrees = take_within_budget(
            pools.remove(&RecipeCategory::Entree).unwrap_or_default(),
            entree_budget,
            rules.max_entrees,
        );
        if entrees.is_empty() {
            debug!(maximum, entree_budget, "无主菜可入预算, 组餐失败");
            return ComposedMeal::infeasible(factor_results);
        }
        total += calorie_sum(&entrees);
        selected.extend(entrees);

        // === 阶段 2: 配菜 ===
        let side_budget = f64::from(maximum - total - self.config.side_stage_reserve);
        let sides = take_within_budget(
            pools.remove(&RecipeCategory::Side).unwrap_or_default(),
            side_budget,
            rules.max_sides,
        );
        total += calorie_sum(&sides);
        selected.extend(sides);

        // === 阶段 3: 饮品 ===
        let beverage_budget = f64::from(maximum - total - self.config.beverage_stage_reserve);
        let beverages = take_within_budget(
            pools.remove(&RecipeCategory::Beverage).unwrap_or_default(),
            beverage_budget,
            rules.max_beverages,
        );
        total += calorie_sum(&beverages);
        selected.extend(beverages);

        // === 阶段 4: 甜点 ===
        let dessert_budget = f64::from(maximum - total);
        let desserts = take_within_budget(
            pools.remove(&RecipeCategory::Dessert).unwrap_or_default(),
            dessert_budget,
            rules.max_desserts,
        );
        total += calorie_sum(&desserts);
        selected.extend(desserts);

        // === 终检: 含主菜 且 总热量入区间 ===
        let meal = ComposedMeal {
            recipes: selected,
            total_calories: total,
            meets_constraints: true,
            factor_results,
        };
        if meal.has_entree() && range.contains(total) {
            debug!(total, recipes = meal.recipes.len(), "组餐成功");
            meal
        } else {
            debug!(
                total,
                minimum = range.minimum,
                maximum,
                "总热量不满足区间, 组餐失败"
            );
            ComposedMeal::infeasible(meal.factor_results)
        }
    }
}

/// 按类别分池, 池内按分数降序 (同分保持目录顺序)
fn split_by_category(scored: Vec<ScoredRecipe>) -> HashMap<RecipeCategory, Vec<ScoredRecipe>> {
    let mut pools: HashMap<RecipeCategory, Vec<ScoredRecipe>> = HashMap::new();
    for candidate in scored {
        pools
            .entry(candidate.recipe.category)
            .or_default()
            .push(candidate);
    }
    for pool in pools.values_mut() {
        pool.sort_by(|a, b| b.score.cmp(&a.score));
    }
    pools
}

/// 单阶段贪心: 依次尝试, 超出当前剩余预算就跳过
fn take_within_budget(pool: Vec<ScoredRecipe>, budget: f64, max_count: usize) -> Vec<Recipe> {
    let mut remaining = budget;
    let mut picked = Vec::new();

    for candidate in pool {
        if picked.len() >= max_count {
            break;
        }
        let calories = f64::from(candidate.recipe.calories);
        if calories <= remaining {
            remaining -= calories;
            picked.push(candidate.recipe);
        }
    }
    picked
}

fn calorie_sum(recipes: &[Recipe]) -> i32 {
    recipes.iter().map(|r| r.calories).sum()
}
