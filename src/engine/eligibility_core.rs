// ==========================================
// 智能膳食订餐系统 - 热量预算纯函数库
// ==========================================
// 职责: 提供追赶预算与剩余餐次的纯计算
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::types::MealOccasion;

// ==========================================
// EligibilityCore - 纯函数工具类
// ==========================================
pub struct EligibilityCore;

impl EligibilityCore {
    /// 计算当日剩余的自动订餐餐次数 (含当前餐次)
    ///
    /// # 规则
    /// - 剩余 = |{早餐, 午餐, 晚餐}| − |已订集合 ∩ {早餐, 午餐, 晚餐}|
    /// - 加餐订单不占用自动餐次名额
    ///
    /// # 参数
    /// - ordered: 当日已持有订单的餐次 (任何来源)
    pub fn remaining_occasions(ordered: &[MealOccasion]) -> usize {
        MealOccasion::AUTO_ORDERABLE
            .iter()
            .filter(|occasion| !ordered.contains(occasion))
            .count()
    }

    /// 计算追赶预算: 单餐热量区间
    ///
    /// # 规则
    /// - per_min = round(max(0, daily_min − consumed) / remaining)
    /// - per_max = round(max(0, daily_max − consumed) / remaining)
    /// - remaining == 0 退化: min = 0, max = daily_max
    ///
    /// 前序餐次吃多吃少都会改变剩余额度, 后续餐次据此收紧
    /// 或放宽自己的份额
    ///
    /// # 参数
    /// - daily_min / daily_max: 医嘱每日热量区间 (kcal)
    /// - consumed: 当日已提交订单的热量合计 (kcal)
    /// - remaining_occasions: 剩余自动餐次数 (含当前)
    ///
    /// # 返回
    /// - (i32, i32): 单餐 (下限, 上限)
    pub fn catch_up_range(
        daily_min: i32,
        daily_max: i32,
        consumed: i32,
        remaining_occasions: usize,
    ) -> (i32, i32) {
        if remaining_occasions == 0 {
            return (0, daily_max);
        }

        let remaining = remaining_occasions as f64;
        let per_min = (f64::from((daily_min - consumed).max(0)) / remaining).round() as i32;
        let per_max = (f64::from((daily_max - consumed).max(0)) / remaining).round() as i32;
        (per_min, per_max)
    }
}
