// ==========================================
// 智能膳食订餐系统 - 运行记录模型
// ==========================================
// 生命周期: 单元记录只存在于一次运行内的一个 (患者, 餐次)
// 处理过程中; 本层不落库, 持久化由协作方完成
// ==========================================

use crate::domain::recipe::Recipe;
use crate::domain::types::{CalorieSource, MealOccasion, RecipeCategory, ReviewReason};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CalorieRange - 单餐热量区间
// ==========================================
// 不变量: minimum <= maximum
// 红线: source = SYSTEM_DEFAULT 时下游订单必须标记复核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieRange {
    pub minimum: i32,
    pub maximum: i32,
    pub source: CalorieSource,
}

impl CalorieRange {
    pub fn new(minimum: i32, maximum: i32, source: CalorieSource) -> Self {
        Self {
            minimum,
            maximum,
            source,
        }
    }

    /// 是否为系统默认兜底区间
    pub fn is_system_default(&self) -> bool {
        self.source == CalorieSource::SystemDefault
    }

    /// 热量值是否落在区间内（双端含）
    pub fn contains(&self, calories: i32) -> bool {
        calories >= self.minimum && calories <= self.maximum
    }
}

// ==========================================
// SelectionContext - 选餐上下文
// ==========================================
// 每个 (患者, 餐次) 单元构建一次, 只读传给全部选餐因子
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionContext {
    pub patient_id: String,
    pub meal_occasion: MealOccasion,
    pub calorie_range: CalorieRange,
}

impl SelectionContext {
    pub fn new(patient_id: &str, meal_occasion: MealOccasion, calorie_range: CalorieRange) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            meal_occasion,
            calorie_range,
        }
    }
}

// ==========================================
// FactorEvaluationResult - 因子执行记录
// ==========================================
// 每次管道执行中每个因子产生一条; 创建后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorEvaluationResult {
    pub factor_name: String,
    pub applied: bool,
    pub reason: String,
    pub flag_for_review: bool,
}

// ==========================================
// ScoredRecipe - 带评分的候选菜品
// ==========================================
#[derive(Debug, Clone)]
pub struct ScoredRecipe {
    pub recipe: Recipe,
    pub score: i32,
}

// ==========================================
// ComposedMeal - 组餐结果
// ==========================================
// 每次组餐尝试产生一个; 失败时 recipes 必须为空
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposedMeal {
    pub recipes: Vec<Recipe>,
    pub total_calories: i32,
    pub meets_constraints: bool,
    pub factor_results: Vec<FactorEvaluationResult>,
}

impl ComposedMeal {
    /// 组餐失败结果（零菜品）
    pub fn infeasible(factor_results: Vec<FactorEvaluationResult>) -> Self {
        Self {
            recipes: Vec::new(),
            total_calories: 0,
            meets_constraints: false,
            factor_results,
        }
    }

    /// 是否包含至少一道主菜
    pub fn has_entree(&self) -> bool {
        self.recipes
            .iter()
            .any(|r| r.category == RecipeCategory::Entree)
    }
}

// ==========================================
// MealOrderOutcome - 单元终态记录
// ==========================================
// 每个 (患者, 餐次) 单元产生一条, 成功失败都进入汇总,
// 不允许静默丢弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealOrderOutcome {
    // ===== 单元标识 =====
    pub patient_id: String,
    pub patient_name: String,
    pub meal_occasion: MealOccasion,
    pub scheduled_for: DateTime<Utc>,

    // ===== 结果 =====
    pub success: bool,
    pub order_id: Option<String>,      // 成功时为创建的订单号
    pub total_calories: Option<i32>,   // 成功时为整餐热量
    pub failure_reason: Option<String>, // 失败时为失败原因

    // ===== 复核信息 =====
    pub calorie_source: CalorieSource,
    pub review_reasons: Vec<ReviewReason>,
    pub requires_staff_review: bool,
    pub applied_factors: Vec<String>,
}

// ==========================================
// OrderingRunSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingRunSummary {
    pub executed_at: DateTime<Utc>,
    pub target_date: NaiveDate,
    pub occasions_processed: Vec<MealOccasion>,
    pub orders_created: usize,
    pub orders_failed: usize,
    pub orders_requiring_review: usize,
    pub review_reason_counts: HashMap<ReviewReason, usize>,
    pub outcomes: Vec<MealOrderOutcome>,
}

impl OrderingRunSummary {
    /// 无可处理餐次时的空汇总
    pub fn empty(target_date: NaiveDate) -> Self {
        Self {
            executed_at: Utc::now(),
            target_date,
            occasions_processed: Vec::new(),
            orders_created: 0,
            orders_failed: 0,
            orders_requiring_review: 0,
            review_reason_counts: HashMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// 由单元结果列表聚合汇总
    ///
    /// # 参数
    /// - target_date: 目标供餐日期
    /// - occasions: 本次处理的餐次（按处理顺序）
    /// - outcomes: 全部单元结果
    pub fn aggregate(
        target_date: NaiveDate,
        occasions: Vec<MealOccasion>,
        outcomes: Vec<MealOrderOutcome>,
    ) -> Self {
        let orders_created = outcomes.iter().filter(|o| o.success).count();
        let orders_failed = outcomes.iter().filter(|o| !o.success).count();
        let orders_requiring_review = outcomes
            .iter()
            .filter(|o| o.requires_staff_review)
            .count();

        // 运行级按出现次数统计, 跨单元的重复原因累加
        let mut review_reason_counts: HashMap<ReviewReason, usize> = HashMap::new();
        for outcome in &outcomes {
            for reason in &outcome.review_reasons {
                *review_reason_counts.entry(*reason).or_insert(0) += 1;
            }
        }

        Self {
            executed_at: Utc::now(),
            target_date,
            occasions_processed: occasions,
            orders_created,
            orders_failed,
            orders_requiring_review,
            review_reason_counts,
            outcomes,
        }
    }
}
