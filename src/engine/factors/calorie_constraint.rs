// ==========================================
// 智能膳食订餐系统 - 热量约束因子
// ==========================================
// 职责: 按单餐热量上限过滤 + 按类别目标热量评分
// 复核信号: 预算来源为 SYSTEM_DEFAULT 时要求人工复核
// ==========================================

use crate::config::CategoryTargetShares;
use crate::domain::outcome::SelectionContext;
use crate::domain::recipe::Recipe;
use crate::domain::types::ReviewReason;
use crate::engine::factors::pipeline::SelectionFactor;

// ==========================================
// CalorieConstraintFactor - 热量约束因子
// ==========================================
pub struct CalorieConstraintFactor {
    shares: CategoryTargetShares,
}

impl CalorieConstraintFactor {
    pub fn new(shares: CategoryTargetShares) -> Self {
        Self { shares }
    }

    /// 类别目标热量 = 目标占比 × 单餐热量上限
    fn target_for(&self, recipe: &Recipe, context: &SelectionContext) -> f64 {
        self.shares.share_for(recipe.category) * f64::from(context.calorie_range.maximum)
    }
}

impl SelectionFactor for CalorieConstraintFactor {
    fn name(&self) -> &'static str {
        "CALORIE_CONSTRAINT"
    }

    /// 滤除单品热量超过单餐上限的菜品
    fn filter(&self, recipes: Vec<Recipe>, context: &SelectionContext) -> Vec<Recipe> {
        let maximum = context.calorie_range.maximum;
        recipes
            .into_iter()
            .filter(|recipe| recipe.calories <= maximum)
            .collect()
    }

    /// 评分: 与类别目标热量越接近分越高
    ///
    /// # 规则
    /// - score = round(100 × (1 − min(|calories − target| / target, 1)))
    /// - 偏差按目标自身归一: 正中目标 100 分, 偏差达一倍目标
    ///   (或热量为 0) 时趋近 0 分
    fn score(&self, recipe: &Recipe, context: &SelectionContext) -> i32 {
        let target = self.target_for(recipe, context);
        if target <= 0.0 {
            return 0;
        }
        let deviation = ((f64::from(recipe.calories) - target).abs() / target).min(1.0);
        (100.0 * (1.0 - deviation)).round() as i32
    }

    fn requires_review(&self, context: &SelectionContext) -> bool {
        context.calorie_range.is_system_default()
    }

    fn review_reason(&self) -> ReviewReason {
        ReviewReason::DefaultCalorieConstraints
    }
}
