// ==========================================
// 智能膳食订餐系统 - 订餐时间窗口判定
// ==========================================
// 职责: 当前时刻 → 处于订餐窗口内的餐次集合
// 红线: 无状态、无副作用、无 I/O; 加餐永不进入窗口
// ==========================================

use crate::config::OrderingConfig;
use crate::domain::types::MealOccasion;
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use std::sync::Arc;

// ==========================================
// TimeWindowResolver - 时间窗口判定器
// ==========================================
pub struct TimeWindowResolver {
    config: Arc<OrderingConfig>,
}

impl TimeWindowResolver {
    /// 创建新的 TimeWindowResolver 实例
    pub fn new(config: Arc<OrderingConfig>) -> Self {
        Self { config }
    }

    /// 当前处于订餐窗口内的餐次 (固定顺序: 早餐 → 午餐 → 晚餐)
    ///
    /// # 规则
    /// - 窗口 = [供餐小时 − advance_order_hours, 供餐小时], 双端含
    /// - now_in_hours = UTC 小时 + 分钟/60 (分钟粒度)
    ///
    /// # 参数
    /// - now: 当前时刻 (UTC)
    pub fn occasions_due(&self, now: DateTime<Utc>) -> Vec<MealOccasion> {
        let now_in_hours = f64::from(now.hour()) + f64::from(now.minute()) / 60.0;

        MealOccasion::AUTO_ORDERABLE
            .iter()
            .copied()
            .filter(|occasion| self.is_window_open(*occasion, now_in_hours))
            .collect()
    }

    /// 单个餐次的窗口判定
    fn is_window_open(&self, occasion: MealOccasion, now_in_hours: f64) -> bool {
        let Some(service_hour) = self.config.service_hours.hour_for(occasion) else {
            return false; // 加餐无供餐时刻
        };
        let service = f64::from(service_hour);
        let opens_at = service - f64::from(self.config.advance_order_hours);
        now_in_hours >= opens_at && now_in_hours <= service
    }

    /// 供餐时刻: 目标日期 + 餐次固定小时 (UTC 整点)
    ///
    /// # 返回
    /// - None: 加餐无供餐时刻
    pub fn service_datetime(
        &self,
        date: NaiveDate,
        occasion: MealOccasion,
    ) -> Option<DateTime<Utc>> {
        let hour = self.config.service_hours.hour_for(occasion)?;
        let naive = date.and_hms_opt(hour, 0, 0)?;
        Some(Utc.from_utc_datetime(&naive))
    }
}
