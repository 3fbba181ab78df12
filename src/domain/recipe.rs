// ==========================================
// 智能膳食订餐系统 - 菜品领域模型
// ==========================================
// 用途: 组餐候选; 厨房菜单系统维护, 本系统只读
// ==========================================

use crate::domain::types::RecipeCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Recipe - 菜品主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    // ===== 主键 =====
    pub recipe_id: String, // 菜品唯一标识

    // ===== 基础信息 =====
    pub name: String,               // 菜品名称
    pub category: RecipeCategory,   // 类别（主菜/配菜/饮品/甜点）
    pub calories: i32,              // 单份热量（kcal）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}
