// ==========================================
// 智能膳食订餐系统 - 餐盘订单领域模型
// ==========================================
// 红线: 订单行与菜品关联行必须在同一事务内落库,
//       不允许出现只有订单没有菜品关联的中间状态
// 红线: (patient_id, meal_occasion, service_date) 唯一
// ==========================================

use crate::domain::types::{CalorieSource, MealOccasion};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// TrayOrder - 餐盘订单
// ==========================================
// 对齐: tray_order 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrayOrder {
    // ===== 主键与关联 =====
    pub order_id: String,   // 订单唯一标识（UUID v4）
    pub patient_id: String, // 关联 patient（FK）

    // ===== 订餐信息 =====
    pub meal_occasion: MealOccasion,    // 餐次
    pub service_date: NaiveDate,        // 供餐日期（唯一性口径）
    pub scheduled_for: DateTime<Utc>,   // 供餐时刻（日期 + 餐次固定小时）
    pub total_calories: i32,            // 整餐热量合计（kcal）
    pub calorie_source: CalorieSource,  // 热量约束来源
    pub auto_generated: bool,           // 是否由自动订餐生成

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
}

// ==========================================
// TrayOrderRecipe - 订单菜品关联
// ==========================================
// 对齐: tray_order_recipe 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrayOrderRecipe {
    pub order_id: String,  // 关联 tray_order（FK）
    pub recipe_id: String, // 关联 recipe（FK）
    pub quantity: i32,     // 份数（自动订餐固定为 1）
}

// ==========================================
// TrayOrderDraft - 待落库订单
// ==========================================
// 引擎产出的落库输入; order_id 与 created_at 由仓储在
// 插入事务内生成
#[derive(Debug, Clone)]
pub struct TrayOrderDraft {
    pub patient_id: String,
    pub meal_occasion: MealOccasion,
    pub service_date: NaiveDate,
    pub scheduled_for: DateTime<Utc>,
    pub total_calories: i32,
    pub calorie_source: CalorieSource,
    pub recipe_ids: Vec<String>,
}
