// ==========================================
// 智能膳食订餐系统 - 协作方存储接口
// ==========================================
// 职责: 定义订餐引擎对外部数据源的全部依赖 (只声明接口)
// 实现者: repository 层 SQLite 仓储; 测试中为内存 Mock
// 红线: 不包含业务逻辑; 引擎不得绕过本接口直接访问数据库
// ==========================================

use crate::domain::order::{TrayOrder, TrayOrderDraft};
use crate::domain::patient::{DietOrder, Patient};
use crate::domain::recipe::Recipe;
use crate::domain::types::MealOccasion;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

// ==========================================
// PatientDirectory Trait
// ==========================================
// 患者目录: 院方 EHR 维护, 本系统只读
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// 列出全部在院患者
    async fn list_patients(&self) -> RepositoryResult<Vec<Patient>>;

    /// 查询患者当前生效的医嘱膳食
    ///
    /// # 返回
    /// - None: 无生效医嘱 (下游降级为系统默认区间)
    async fn find_active_diet_order(&self, patient_id: &str)
        -> RepositoryResult<Option<DietOrder>>;
}

// ==========================================
// RecipeCatalog Trait
// ==========================================
// 菜品目录: 厨房菜单系统维护, 本系统只读
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    /// 列出全部可组餐菜品 (含类别与热量)
    async fn list_recipes(&self) -> RepositoryResult<Vec<Recipe>>;
}

// ==========================================
// OrderStore Trait
// ==========================================
// 订单存储: 本系统唯一的写入口
// 红线: create_order 必须原子落库 (订单行 + 菜品关联行),
//       并由 (patient_id, meal_occasion, service_date) 唯一约束
//       保证并发下的幂等性
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 查询某患者在指定日期 + 餐次下的既有订单
    async fn find_orders(
        &self,
        patient_id: &str,
        occasion: MealOccasion,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<TrayOrder>>;

    /// 指定日期 + 餐次下已持有订单的患者 ID 集合
    ///
    /// 资格计算用它做一次性差集, 避免逐患者循环查询
    async fn patients_with_order(
        &self,
        service_date: NaiveDate,
        occasion: MealOccasion,
    ) -> RepositoryResult<HashSet<String>>;

    /// 患者当日已订餐次列表 (任何来源的订单, 含人工加餐)
    async fn occasions_ordered(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<MealOccasion>>;

    /// 患者当日已提交订单的热量合计 (kcal)
    ///
    /// 追赶预算的"已消耗"口径: 关联菜品热量按份数求和
    async fn calories_committed(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<i32>;

    /// 原子创建订单及其菜品关联
    ///
    /// # 返回
    /// - 落库后的完整订单 (含仓储生成的 order_id)
    ///
    /// # 错误
    /// - UniqueConstraintViolation: 同 (患者, 餐次, 日期) 已有订单
    async fn create_order(&self, draft: &TrayOrderDraft) -> RepositoryResult<TrayOrder>;
}

// ==========================================
// OrderingStores - 存储聚合
// ==========================================
/// 订餐引擎存储集合
///
/// 将三个协作方接口合并为一个结构体参数, 简化编排器的
/// 依赖注入, 也便于测试时整体替换为 Mock。
#[derive(Clone)]
pub struct OrderingStores {
    /// 患者目录
    pub patients: Arc<dyn PatientDirectory>,
    /// 菜品目录
    pub recipes: Arc<dyn RecipeCatalog>,
    /// 订单存储
    pub orders: Arc<dyn OrderStore>,
}

impl OrderingStores {
    /// 创建新的存储集合
    pub fn new(
        patients: Arc<dyn PatientDirectory>,
        recipes: Arc<dyn RecipeCatalog>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            patients,
            recipes,
            orders,
        }
    }
}

// 注: 本模块只有接口声明, 行为正确性由 repository 层的
// 单元测试与 tests/ 下的集成测试覆盖。
