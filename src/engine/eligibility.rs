// ==========================================
// 智能膳食订餐系统 - 订餐资格与预算解析
// ==========================================
// 职责: 找出缺单患者 + 解析单餐热量预算 (含追赶逻辑)
// 输入: 患者目录 + 订单存储
// 红线: 差集一次算完, 不做逐患者循环查询;
//       资格口径 = (供餐日期, 餐次) 联合
// ==========================================

use crate::config::OrderingConfig;
use crate::domain::outcome::CalorieRange;
use crate::domain::patient::Patient;
use crate::domain::types::{CalorieSource, MealOccasion};
use crate::engine::eligibility_core::EligibilityCore;
use crate::engine::stores::OrderingStores;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// EligibilityResolver - 资格与预算解析器
// ==========================================
pub struct EligibilityResolver {
    stores: OrderingStores,
    config: Arc<OrderingConfig>,
}

impl EligibilityResolver {
    /// 创建新的 EligibilityResolver 实例
    pub fn new(stores: OrderingStores, config: Arc<OrderingConfig>) -> Self {
        Self { stores, config }
    }

    /// 查询指定 (日期, 餐次) 下尚无订单的患者
    ///
    /// # 规则
    /// - 读一次患者全量 + 读一次已订患者集合, 差集得出
    /// - 其他餐次的订单不影响本餐次的资格
    pub async fn patients_needing_order(
        &self,
        service_date: NaiveDate,
        occasion: MealOccasion,
    ) -> RepositoryResult<Vec<Patient>> {
        let patients = self.stores.patients.list_patients().await?;
        let with_order = self
            .stores
            .orders
            .patients_with_order(service_date, occasion)
            .await?;

        let needy: Vec<Patient> = patients
            .into_iter()
            .filter(|p| !with_order.contains(&p.patient_id))
            .collect();

        debug!(
            occasion = %occasion,
            service_date = %service_date,
            needy = needy.len(),
            already_ordered = with_order.len(),
            "资格差集计算完成"
        );
        Ok(needy)
    }

    /// 解析患者该餐次的热量预算
    ///
    /// # 规则
    /// - 有完整医嘱区间: 按当日已消耗热量与剩余餐次做追赶分摊
    ///   (source = DIET_ORDER)
    /// - 无医嘱或区间不完整: 直接取系统默认单餐区间
    ///   (source = SYSTEM_DEFAULT, 不做追赶)
    pub async fn resolve_calorie_range(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<CalorieRange> {
        let diet_order = self.stores.patients.find_active_diet_order(patient_id).await?;

        let usable = diet_order.as_ref().and_then(|order| order.usable_range());
        let Some((daily_min, daily_max)) = usable else {
            debug!(patient_id, "无可用医嘱, 降级为系统默认热量区间");
            return Ok(self.config.default_calorie_range());
        };

        let consumed = self
            .stores
            .orders
            .calories_committed(patient_id, service_date)
            .await?;
        let ordered = self
            .stores
            .orders
            .occasions_ordered(patient_id, service_date)
            .await?;
        let remaining = EligibilityCore::remaining_occasions(&ordered);

        let (minimum, maximum) =
            EligibilityCore::catch_up_range(daily_min, daily_max, consumed, remaining);

        debug!(
            patient_id,
            daily_min,
            daily_max,
            consumed,
            remaining,
            minimum,
            maximum,
            "医嘱追赶预算解析完成"
        );
        Ok(CalorieRange::new(minimum, maximum, CalorieSource::DietOrder))
    }
}
