// ==========================================
// 智能膳食订餐系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、运行记录
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod order;
pub mod outcome;
pub mod patient;
pub mod recipe;
pub mod types;

// 重导出核心类型
pub use order::{TrayOrder, TrayOrderDraft, TrayOrderRecipe};
pub use outcome::{
    CalorieRange, ComposedMeal, FactorEvaluationResult, MealOrderOutcome, OrderingRunSummary,
    ScoredRecipe, SelectionContext,
};
pub use patient::{DietOrder, Patient};
pub use recipe::Recipe;
pub use types::{CalorieSource, MealOccasion, RecipeCategory, ReviewReason, UnitState};
