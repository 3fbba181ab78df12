// ==========================================
// 智能膳食订餐系统 - 护理站通知
// ==========================================
// 职责: 定义复核通知 trait，实现依赖倒置
// 说明: Engine 层定义 trait，外层 (CLI/集成方) 提供实现
// 红线: 通知失败绝不回滚已落库订单，只记日志
// ==========================================

use crate::domain::types::{MealOccasion, ReviewReason};
use crate::i18n;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 通知优先级
// ==========================================

/// 复核通知优先级
///
/// 缺过敏数据或缺质地要求属于临床安全问题, 升级为紧急;
/// 其余 (默认热量兜底等) 走常规队列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    Urgent,
    Routine,
}

impl NotificationPriority {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            NotificationPriority::Urgent => "URGENT",
            NotificationPriority::Routine => "ROUTINE",
        }
    }

    /// 优先级标签的 i18n key
    pub fn message_key(&self) -> &'static str {
        match self {
            NotificationPriority::Urgent => "notify.priority_urgent",
            NotificationPriority::Routine => "notify.priority_routine",
        }
    }
}

// ==========================================
// ReviewNotification - 复核通知
// ==========================================

/// 需要护理人员复核的订餐告警
///
/// 订单成功落库但带复核原因时产生一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewNotification {
    /// 患者 ID
    pub patient_id: String,
    /// 患者姓名 (通知文案直接展示)
    pub patient_name: String,
    /// 关联订单号 (组餐失败未成单时为 None)
    pub order_id: Option<String>,
    /// 餐次
    pub meal_occasion: MealOccasion,
    /// 复核原因 (去重后, 登记顺序)
    pub review_reasons: Vec<ReviewReason>,
}

impl ReviewNotification {
    /// 根据原因集合判定优先级
    ///
    /// # 规则
    /// 含 MISSING_ALLERGY_DATA 或 MISSING_TEXTURE_REQUIREMENT
    /// 任一即为紧急, 否则常规
    pub fn priority(&self) -> NotificationPriority {
        let urgent = self.review_reasons.iter().any(|r| {
            matches!(
                r,
                ReviewReason::MissingAllergyData | ReviewReason::MissingTextureRequirement
            )
        });
        if urgent {
            NotificationPriority::Urgent
        } else {
            NotificationPriority::Routine
        }
    }

    /// 拼装通知文案
    ///
    /// 每个原因经 i18n 查表得到一句话, 按登记顺序以 "; " 连接
    pub fn message(&self) -> String {
        self.review_reasons
            .iter()
            .map(|r| i18n::review_reason_text(*r))
            .collect::<Vec<String>>()
            .join("; ")
    }
}

// ==========================================
// 通知 Trait
// ==========================================

/// 护理站通知者 Trait
///
/// Engine 层定义, 外层实现 (对接呼叫系统/工单系统等)
/// 通过 trait 实现依赖倒置, Engine 不感知通知渠道
pub trait StaffNotifier: Send + Sync {
    /// 发送复核通知
    ///
    /// # 参数
    /// - `notification`: 复核通知
    ///
    /// # 返回
    /// - `Err`: 发送失败 (调用方只记日志, 不影响订单)
    fn notify(&self, notification: &ReviewNotification) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 日志通知者
///
/// 缺省实现: 把通知写进结构化日志, 护理站在日志面板消费
#[derive(Debug, Clone, Default)]
pub struct LoggingStaffNotifier;

impl StaffNotifier for LoggingStaffNotifier {
    fn notify(&self, notification: &ReviewNotification) -> Result<(), Box<dyn Error + Send + Sync>> {
        let priority = notification.priority();
        let label = i18n::t(priority.message_key());
        let headline = i18n::t_with_args("notify.staff_headline", &[("priority", &label)]);
        match priority {
            NotificationPriority::Urgent => {
                tracing::warn!(
                    patient_id = %notification.patient_id,
                    patient_name = %notification.patient_name,
                    meal_occasion = %notification.meal_occasion,
                    order_id = ?notification.order_id,
                    priority = priority.as_str(),
                    "{}: {}",
                    headline,
                    notification.message()
                );
            }
            NotificationPriority::Routine => {
                tracing::info!(
                    patient_id = %notification.patient_id,
                    patient_name = %notification.patient_name,
                    meal_occasion = %notification.meal_occasion,
                    order_id = ?notification.order_id,
                    priority = priority.as_str(),
                    "{}: {}",
                    headline,
                    notification.message()
                );
            }
        }
        Ok(())
    }
}

/// 空操作通知者
///
/// 用于不需要通知的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpStaffNotifier;

impl StaffNotifier for NoOpStaffNotifier {
    fn notify(&self, notification: &ReviewNotification) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpStaffNotifier: 跳过通知 - patient_id={}, priority={}",
            notification.patient_id,
            notification.priority().as_str()
        );
        Ok(())
    }
}

/// 可选的通知者包装
///
/// 简化 Option<Arc<dyn StaffNotifier>> 的使用
pub struct OptionalStaffNotifier {
    inner: Option<Arc<dyn StaffNotifier>>,
}

impl OptionalStaffNotifier {
    /// 创建带通知者的实例
    pub fn with_notifier(notifier: Arc<dyn StaffNotifier>) -> Self {
        Self {
            inner: Some(notifier),
        }
    }

    /// 创建空实例（不发送通知）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发送通知（如果有通知者）
    pub fn notify(&self, notification: &ReviewNotification) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(notifier) => notifier.notify(notification),
            None => {
                tracing::debug!(
                    "OptionalStaffNotifier: 未配置通知者，跳过 - patient_id={}, priority={}",
                    notification.patient_id,
                    notification.priority().as_str()
                );
                Ok(())
            }
        }
    }

    /// 检查是否配置了通知者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalStaffNotifier {
    fn default() -> Self {
        Self::none()
    }
}
