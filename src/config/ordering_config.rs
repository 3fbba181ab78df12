// ==========================================
// 智能膳食订餐系统 - 订餐配置
// ==========================================
// 职责: 集中全部订餐常量 (窗口/供餐时刻/默认热量/组餐配额/
//       因子开关与权重/强制复核触发项)
// 红线: 配置一次构建后只读, 以 Arc 注入各组件, 不做全局状态
// ==========================================

use crate::domain::outcome::CalorieRange;
use crate::domain::types::{CalorieSource, MealOccasion, RecipeCategory, ReviewReason};
use serde::{Deserialize, Serialize};

// ==========================================
// ServiceHours - 各餐次固定供餐小时 (UTC, 24h制)
// ==========================================
// 加餐无供餐时刻, 不出现在这里
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceHours {
    pub breakfast: u32,
    pub lunch: u32,
    pub dinner: u32,
}

impl Default for ServiceHours {
    fn default() -> Self {
        Self {
            breakfast: 8,
            lunch: 12,
            dinner: 18,
        }
    }
}

impl ServiceHours {
    /// 餐次对应的供餐小时; 加餐返回 None
    pub fn hour_for(&self, occasion: MealOccasion) -> Option<u32> {
        match occasion {
            MealOccasion::Breakfast => Some(self.breakfast),
            MealOccasion::Lunch => Some(self.lunch),
            MealOccasion::Dinner => Some(self.dinner),
            MealOccasion::Snack => None,
        }
    }
}

// ==========================================
// CompositionRules - 组餐配额
// ==========================================
// 每类菜品的最少/最多份数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompositionRules {
    pub min_entrees: usize,
    pub max_entrees: usize,
    pub min_sides: usize,
    pub max_sides: usize,
    pub min_beverages: usize,
    pub max_beverages: usize,
    pub min_desserts: usize,
    pub max_desserts: usize,
}

impl Default for CompositionRules {
    fn default() -> Self {
        Self {
            min_entrees: 1,
            max_entrees: 1,
            min_sides: 1,
            max_sides: 2,
            min_beverages: 1,
            max_beverages: 1,
            min_desserts: 1,
            max_desserts: 1,
        }
    }
}

impl CompositionRules {
    /// 类别允许的最大份数
    pub fn max_for(&self, category: RecipeCategory) -> usize {
        match category {
            RecipeCategory::Entree => self.max_entrees,
            RecipeCategory::Side => self.max_sides,
            RecipeCategory::Beverage => self.max_beverages,
            RecipeCategory::Dessert => self.max_desserts,
            RecipeCategory::Unknown => 0,
        }
    }
}

// ==========================================
// CategoryTargetShares - 类别热量目标占比
// ==========================================
// 评分基准: 目标热量 = 占比 × 单餐热量上限
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryTargetShares {
    pub entree: f64,
    pub side: f64,
    pub beverage: f64,
    pub dessert: f64,
    pub fallback: f64, // 未识别类别
}

impl Default for CategoryTargetShares {
    fn default() -> Self {
        Self {
            entree: 0.50,
            side: 0.20,
            beverage: 0.05,
            dessert: 0.15,
            fallback: 0.25,
        }
    }
}

impl CategoryTargetShares {
    pub fn share_for(&self, category: RecipeCategory) -> f64 {
        match category {
            RecipeCategory::Entree => self.entree,
            RecipeCategory::Side => self.side,
            RecipeCategory::Beverage => self.beverage,
            RecipeCategory::Dessert => self.dessert,
            RecipeCategory::Unknown => self.fallback,
        }
    }
}

// ==========================================
// FactorSettings - 单个选餐因子配置
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorSettings {
    pub enabled: bool,
    pub weight: i32, // 加权求和: score × weight / 100
}

// ==========================================
// SelectionFactorTable - 因子配置表
// ==========================================
// 顺序语义在管道内固定: 安全因子 → 运行因子 → 偏好因子
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionFactorTable {
    pub allergy_safety: FactorSettings,
    pub texture_modification: FactorSettings,
    pub calorie_constraint: FactorSettings,
    pub religious_dietary: FactorSettings,
}

impl Default for SelectionFactorTable {
    fn default() -> Self {
        Self {
            allergy_safety: FactorSettings {
                enabled: false,
                weight: 1000,
            },
            texture_modification: FactorSettings {
                enabled: false,
                weight: 500,
            },
            calorie_constraint: FactorSettings {
                enabled: true,
                weight: 100,
            },
            religious_dietary: FactorSettings {
                enabled: false,
                weight: 200,
            },
        }
    }
}

// ==========================================
// OrderingConfig - 订餐配置全集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// 提前订餐窗口 (小时): 窗口 = [供餐时刻 - advance, 供餐时刻], 双端含
    #[serde(default = "default_advance_order_hours")]
    pub advance_order_hours: u32,

    /// 各餐次供餐时刻
    #[serde(default)]
    pub service_hours: ServiceHours,

    /// 无可用医嘱时的单餐默认热量下限 (kcal)
    #[serde(default = "default_calorie_minimum")]
    pub default_calorie_minimum: i32,

    /// 无可用医嘱时的单餐默认热量上限 (kcal)
    #[serde(default = "default_calorie_maximum")]
    pub default_calorie_maximum: i32,

    /// 组餐配额
    #[serde(default)]
    pub composition_rules: CompositionRules,

    /// 主菜阶段预算占热量上限的比例
    #[serde(default = "default_entree_budget_share")]
    pub entree_budget_share: f64,

    /// 配菜阶段预留 (kcal, 留给饮品+甜点)
    #[serde(default = "default_side_stage_reserve")]
    pub side_stage_reserve: i32,

    /// 饮品阶段预留 (kcal, 留给甜点)
    #[serde(default = "default_beverage_stage_reserve")]
    pub beverage_stage_reserve: i32,

    /// 类别热量目标占比
    #[serde(default)]
    pub category_target_shares: CategoryTargetShares,

    /// 选餐因子配置表
    #[serde(default)]
    pub selection_factors: SelectionFactorTable,

    /// 强制复核触发项: 出现即必须人工复核, 任何因子调整都不可豁免
    #[serde(default = "default_mandatory_review_triggers")]
    pub mandatory_review_triggers: Vec<ReviewReason>,
}

fn default_advance_order_hours() -> u32 {
    3
}

fn default_calorie_minimum() -> i32 {
    500
}

fn default_calorie_maximum() -> i32 {
    700
}

fn default_entree_budget_share() -> f64 {
    0.6
}

fn default_side_stage_reserve() -> i32 {
    150
}

fn default_beverage_stage_reserve() -> i32 {
    50
}

fn default_mandatory_review_triggers() -> Vec<ReviewReason> {
    vec![
        ReviewReason::DefaultCalorieConstraints,
        ReviewReason::MissingAllergyData,
        ReviewReason::MissingTextureRequirement,
    ]
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            advance_order_hours: default_advance_order_hours(),
            service_hours: ServiceHours::default(),
            default_calorie_minimum: default_calorie_minimum(),
            default_calorie_maximum: default_calorie_maximum(),
            composition_rules: CompositionRules::default(),
            entree_budget_share: default_entree_budget_share(),
            side_stage_reserve: default_side_stage_reserve(),
            beverage_stage_reserve: default_beverage_stage_reserve(),
            category_target_shares: CategoryTargetShares::default(),
            selection_factors: SelectionFactorTable::default(),
            mandatory_review_triggers: default_mandatory_review_triggers(),
        }
    }
}

impl OrderingConfig {
    /// 系统默认单餐热量区间 (来源恒为 SYSTEM_DEFAULT)
    pub fn default_calorie_range(&self) -> CalorieRange {
        CalorieRange::new(
            self.default_calorie_minimum,
            self.default_calorie_maximum,
            CalorieSource::SystemDefault,
        )
    }

    /// 复核原因集合是否要求人工复核
    ///
    /// 强制触发项出现时无条件复核; 默认语义下任何非空原因
    /// 集合也要求复核
    pub fn requires_staff_review(&self, reasons: &[ReviewReason]) -> bool {
        reasons
            .iter()
            .any(|r| self.mandatory_review_triggers.contains(r))
            || !reasons.is_empty()
    }

    /// 配置合法性检查 (从 JSON 载入外部配置后调用)
    pub fn validate(&self) -> Result<(), String> {
        if self.advance_order_hours == 0 || self.advance_order_hours > 24 {
            return Err(format!(
                "advance_order_hours 必须在 1..=24 之间: {}",
                self.advance_order_hours
            ));
        }
        if self.default_calorie_minimum > self.default_calorie_maximum {
            return Err(format!(
                "默认热量区间非法: minimum {} > maximum {}",
                self.default_calorie_minimum, self.default_calorie_maximum
            ));
        }
        if self.default_calorie_minimum < 0 {
            return Err("默认热量下限不能为负".to_string());
        }
        if !(self.entree_budget_share > 0.0 && self.entree_budget_share <= 1.0) {
            return Err(format!(
                "entree_budget_share 必须在 (0, 1] 之间: {}",
                self.entree_budget_share
            ));
        }
        if self.side_stage_reserve < 0 || self.beverage_stage_reserve < 0 {
            return Err("阶段预留不能为负".to_string());
        }
        let rules = &self.composition_rules;
        if rules.min_entrees > rules.max_entrees
            || rules.min_sides > rules.max_sides
            || rules.min_beverages > rules.max_beverages
            || rules.min_desserts > rules.max_desserts
        {
            return Err("组餐配额非法: 各类别 min 不得大于 max".to_string());
        }
        if rules.max_entrees == 0 {
            return Err("组餐配额非法: 主菜 max 不得为 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OrderingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.advance_order_hours, 3);
        assert_eq!(config.default_calorie_minimum, 500);
        assert_eq!(config.default_calorie_maximum, 700);
        assert_eq!(config.side_stage_reserve, 150);
        assert_eq!(config.beverage_stage_reserve, 50);
    }

    #[test]
    fn test_service_hours_snack_has_no_hour() {
        let hours = ServiceHours::default();
        assert_eq!(hours.hour_for(MealOccasion::Breakfast), Some(8));
        assert_eq!(hours.hour_for(MealOccasion::Lunch), Some(12));
        assert_eq!(hours.hour_for(MealOccasion::Dinner), Some(18));
        assert_eq!(hours.hour_for(MealOccasion::Snack), None);
    }

    #[test]
    fn test_default_range_source_is_system_default() {
        let config = OrderingConfig::default();
        let range = config.default_calorie_range();
        assert_eq!(range.minimum, 500);
        assert_eq!(range.maximum, 700);
        assert_eq!(range.source, CalorieSource::SystemDefault);
    }

    #[test]
    fn test_requires_staff_review() {
        let config = OrderingConfig::default();
        assert!(!config.requires_staff_review(&[]));
        assert!(config.requires_staff_review(&[ReviewReason::MissingAllergyData]));
        // 非强制触发项的原因同样要求复核
        assert!(config.requires_staff_review(&[ReviewReason::MealConstraintNotMet]));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = OrderingConfig {
            default_calorie_minimum: 800,
            default_calorie_maximum: 700,
            ..OrderingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: OrderingConfig =
            serde_json::from_str(r#"{"advance_order_hours": 2}"#).unwrap();
        assert_eq!(config.advance_order_hours, 2);
        assert_eq!(config.default_calorie_maximum, 700);
        assert!(config.selection_factors.calorie_constraint.enabled);
        assert!(!config.selection_factors.allergy_safety.enabled);
        assert_eq!(config.selection_factors.allergy_safety.weight, 1000);
    }

    #[test]
    fn test_unknown_category_quota_is_zero() {
        let rules = CompositionRules::default();
        assert_eq!(rules.max_for(RecipeCategory::Entree), 1);
        assert_eq!(rules.max_for(RecipeCategory::Side), 2);
        assert_eq!(rules.max_for(RecipeCategory::Unknown), 0);
    }
}
