// ==========================================
// 智能膳食订餐系统 - 待接入数据源的占位因子
// ==========================================
// 职责: 过敏 / 质地 / 宗教饮食三个因子的占位实现
// 红线: 数据源未接入前一律要求人工复核; 绝不按人口学
//       特征猜测临床或宗教饮食限制
// ==========================================

use crate::domain::outcome::SelectionContext;
use crate::domain::recipe::Recipe;
use crate::domain::types::ReviewReason;
use crate::engine::factors::pipeline::SelectionFactor;

// ==========================================
// AllergySafetyFactor - 过敏安全因子
// ==========================================
// 等待院方过敏档案接口接入
pub struct AllergySafetyFactor;

impl SelectionFactor for AllergySafetyFactor {
    fn name(&self) -> &'static str {
        "ALLERGY_SAFETY"
    }

    fn filter(&self, recipes: Vec<Recipe>, _context: &SelectionContext) -> Vec<Recipe> {
        recipes
    }

    fn score(&self, _recipe: &Recipe, _context: &SelectionContext) -> i32 {
        0
    }

    fn requires_review(&self, _context: &SelectionContext) -> bool {
        true // 过敏数据缺失, 无条件复核
    }

    fn review_reason(&self) -> ReviewReason {
        ReviewReason::MissingAllergyData
    }
}

// ==========================================
// TextureModificationFactor - 质地调整因子
// ==========================================
// 等待吞咽评估记录接入
pub struct TextureModificationFactor;

impl SelectionFactor for TextureModificationFactor {
    fn name(&self) -> &'static str {
        "TEXTURE_MODIFICATION"
    }

    fn filter(&self, recipes: Vec<Recipe>, _context: &SelectionContext) -> Vec<Recipe> {
        recipes
    }

    fn score(&self, _recipe: &Recipe, _context: &SelectionContext) -> i32 {
        0
    }

    fn requires_review(&self, _context: &SelectionContext) -> bool {
        true
    }

    fn review_reason(&self) -> ReviewReason {
        ReviewReason::MissingTextureRequirement
    }
}

// ==========================================
// ReligiousDietaryFactor - 宗教饮食因子
// ==========================================
// 等待患者本人登记的饮食偏好接入
pub struct ReligiousDietaryFactor;

impl SelectionFactor for ReligiousDietaryFactor {
    fn name(&self) -> &'static str {
        "RELIGIOUS_DIETARY"
    }

    fn filter(&self, recipes: Vec<Recipe>, _context: &SelectionContext) -> Vec<Recipe> {
        recipes
    }

    fn score(&self, _recipe: &Recipe, _context: &SelectionContext) -> i32 {
        0
    }

    fn requires_review(&self, _context: &SelectionContext) -> bool {
        true
    }

    fn review_reason(&self) -> ReviewReason {
        ReviewReason::MissingDietaryPreferences
    }
}
