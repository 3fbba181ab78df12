// ==========================================
// 智能膳食订餐系统 - 患者领域模型
// ==========================================
// 红线: 患者档案由院方 EHR 维护, 本系统只读
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Patient - 患者主数据
// ==========================================
// 用途: 订餐资格计算与订单归属
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    // ===== 主键 =====
    pub patient_id: String, // 患者唯一标识

    // ===== 基础信息 =====
    pub first_name: String,         // 名
    pub last_name: String,          // 姓
    pub room_number: Option<String>, // 房间号

    // ===== 在院信息 =====
    pub admitted_on: Option<NaiveDate>, // 入院日期

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl Patient {
    /// 工作人员告警里使用的显示名
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==========================================
// DietOrder - 医嘱膳食
// ==========================================
// 医生指定的每日热量范围; 两端均有值才可用于约束解析,
// 任一端缺失时按无医嘱处理 (降级为系统默认并标记复核)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietOrder {
    // ===== 主键与关联 =====
    pub diet_order_id: String, // 医嘱唯一标识
    pub patient_id: String,    // 关联 patient（FK）

    // ===== 医嘱内容 =====
    pub diet_name: String,                // 膳食名称（如 "Regular" / "High Calorie"）
    pub daily_calories_min: Option<i32>,  // 每日热量下限（kcal）
    pub daily_calories_max: Option<i32>,  // 每日热量上限（kcal）

    // ===== 生效状态 =====
    pub is_active: bool,            // 是否当前生效
    pub effective_on: Option<NaiveDate>, // 生效日期

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
}

impl DietOrder {
    /// 医嘱给出的完整每日热量区间; 任一端缺失返回 None
    pub fn usable_range(&self) -> Option<(i32, i32)> {
        match (self.daily_calories_min, self.daily_calories_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    /// 医嘱是否给出完整的每日热量区间
    pub fn has_usable_range(&self) -> bool {
        self.usable_range().is_some()
    }
}
