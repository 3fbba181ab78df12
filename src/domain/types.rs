// ==========================================
// 智能膳食订餐系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 红线: 加餐 (Snack) 永不参与自动订餐
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 餐次 (Meal Occasion)
// ==========================================
// 每个餐次有固定供餐时刻; 加餐没有供餐时刻, 只能人工下单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealOccasion {
    Breakfast, // 早餐
    Lunch,     // 午餐
    Dinner,    // 晚餐
    Snack,     // 加餐 (仅人工)
}

impl fmt::Display for MealOccasion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealOccasion::Breakfast => write!(f, "BREAKFAST"),
            MealOccasion::Lunch => write!(f, "LUNCH"),
            MealOccasion::Dinner => write!(f, "DINNER"),
            MealOccasion::Snack => write!(f, "SNACK"),
        }
    }
}

impl MealOccasion {
    /// 自动订餐覆盖的餐次, 按固定处理顺序
    pub const AUTO_ORDERABLE: [MealOccasion; 3] = [
        MealOccasion::Breakfast,
        MealOccasion::Lunch,
        MealOccasion::Dinner,
    ];

    /// 是否参与自动订餐
    pub fn is_auto_orderable(&self) -> bool {
        !matches!(self, MealOccasion::Snack)
    }

    /// 从字符串解析餐次
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BREAKFAST" => Some(MealOccasion::Breakfast),
            "LUNCH" => Some(MealOccasion::Lunch),
            "DINNER" => Some(MealOccasion::Dinner),
            "SNACK" => Some(MealOccasion::Snack),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MealOccasion::Breakfast => "BREAKFAST",
            MealOccasion::Lunch => "LUNCH",
            MealOccasion::Dinner => "DINNER",
            MealOccasion::Snack => "SNACK",
        }
    }
}

// ==========================================
// 菜品类别 (Recipe Category)
// ==========================================
// 数据库中类别为自由文本, 未识别的值归入 Unknown;
// Unknown 菜品不进入任何组餐候选池
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeCategory {
    Entree,   // 主菜
    Side,     // 配菜
    Beverage, // 饮品
    Dessert,  // 甜点
    Unknown,  // 未识别类别
}

impl fmt::Display for RecipeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeCategory::Entree => write!(f, "ENTREE"),
            RecipeCategory::Side => write!(f, "SIDE"),
            RecipeCategory::Beverage => write!(f, "BEVERAGE"),
            RecipeCategory::Dessert => write!(f, "DESSERT"),
            RecipeCategory::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl RecipeCategory {
    /// 组餐阶段顺序: 主菜 → 配菜 → 饮品 → 甜点
    pub const COMPOSITION_ORDER: [RecipeCategory; 4] = [
        RecipeCategory::Entree,
        RecipeCategory::Side,
        RecipeCategory::Beverage,
        RecipeCategory::Dessert,
    ];

    /// 从字符串解析类别
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ENTREE" => RecipeCategory::Entree,
            "SIDE" => RecipeCategory::Side,
            "BEVERAGE" => RecipeCategory::Beverage,
            "DESSERT" => RecipeCategory::Dessert,
            _ => RecipeCategory::Unknown, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RecipeCategory::Entree => "ENTREE",
            RecipeCategory::Side => "SIDE",
            RecipeCategory::Beverage => "BEVERAGE",
            RecipeCategory::Dessert => "DESSERT",
            RecipeCategory::Unknown => "UNKNOWN",
        }
    }
}

// ==========================================
// 热量约束来源 (Calorie Source)
// ==========================================
// 红线: SYSTEM_DEFAULT 的订单必须标记人工复核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalorieSource {
    DietOrder,     // 医嘱膳食
    SystemDefault, // 系统默认值兜底
}

impl fmt::Display for CalorieSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalorieSource::DietOrder => write!(f, "DIET_ORDER"),
            CalorieSource::SystemDefault => write!(f, "SYSTEM_DEFAULT"),
        }
    }
}

impl CalorieSource {
    /// 从字符串解析来源; 未识别的值按保守口径归入系统默认
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DIET_ORDER" => CalorieSource::DietOrder,
            _ => CalorieSource::SystemDefault, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CalorieSource::DietOrder => "DIET_ORDER",
            CalorieSource::SystemDefault => "SYSTEM_DEFAULT",
        }
    }
}

// ==========================================
// 复核原因 (Review Reason)
// ==========================================
// 封闭枚举; 单元内按集合累积, 运行级按出现次数统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewReason {
    DefaultCalorieConstraints, // 使用了系统默认热量约束
    MissingAllergyData,        // 缺少过敏信息
    MissingTextureRequirement, // 缺少食物质地要求
    MissingDietaryPreferences, // 缺少饮食偏好信息
    MealConstraintNotMet,      // 组餐未满足热量约束
    NewPatientNoAssessment,    // 新入院患者未完成评估
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReviewReason {
    /// 从字符串解析复核原因
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEFAULT_CALORIE_CONSTRAINTS" => Some(ReviewReason::DefaultCalorieConstraints),
            "MISSING_ALLERGY_DATA" => Some(ReviewReason::MissingAllergyData),
            "MISSING_TEXTURE_REQUIREMENT" => Some(ReviewReason::MissingTextureRequirement),
            "MISSING_DIETARY_PREFERENCES" => Some(ReviewReason::MissingDietaryPreferences),
            "MEAL_CONSTRAINT_NOT_MET" => Some(ReviewReason::MealConstraintNotMet),
            "NEW_PATIENT_NO_ASSESSMENT" => Some(ReviewReason::NewPatientNoAssessment),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReviewReason::DefaultCalorieConstraints => "DEFAULT_CALORIE_CONSTRAINTS",
            ReviewReason::MissingAllergyData => "MISSING_ALLERGY_DATA",
            ReviewReason::MissingTextureRequirement => "MISSING_TEXTURE_REQUIREMENT",
            ReviewReason::MissingDietaryPreferences => "MISSING_DIETARY_PREFERENCES",
            ReviewReason::MealConstraintNotMet => "MEAL_CONSTRAINT_NOT_MET",
            ReviewReason::NewPatientNoAssessment => "NEW_PATIENT_NO_ASSESSMENT",
        }
    }

    /// 告警文案的 i18n key (locales/app.yml 的 notify.* 条目)
    pub fn message_key(&self) -> &'static str {
        match self {
            ReviewReason::DefaultCalorieConstraints => "notify.default_calorie_constraints",
            ReviewReason::MissingAllergyData => "notify.missing_allergy_data",
            ReviewReason::MissingTextureRequirement => "notify.missing_texture_requirement",
            ReviewReason::MissingDietaryPreferences => "notify.missing_dietary_preferences",
            ReviewReason::MealConstraintNotMet => "notify.meal_constraint_not_met",
            ReviewReason::NewPatientNoAssessment => "notify.new_patient_no_assessment",
        }
    }
}

// ==========================================
// 订餐单元状态 (Order Unit State)
// ==========================================
// 单元 = (患者, 餐次); 状态只向前推进:
// PENDING → CONTEXT_BUILT → COMPOSED → PERSISTED | FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    Pending,      // 待处理
    ContextBuilt, // 已构建选餐上下文
    Composed,     // 已完成组餐
    Persisted,    // 订单已落库 (终态)
    Failed,       // 失败 (终态)
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Pending => write!(f, "PENDING"),
            UnitState::ContextBuilt => write!(f, "CONTEXT_BUILT"),
            UnitState::Composed => write!(f, "COMPOSED"),
            UnitState::Persisted => write!(f, "PERSISTED"),
            UnitState::Failed => write!(f, "FAILED"),
        }
    }
}

impl UnitState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Persisted | UnitState::Failed)
    }
}
