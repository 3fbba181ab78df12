// ==========================================
// 智能膳食订餐系统 - 运行编排器
// ==========================================
// 职责: 驱动一次自动订餐运行 (窗口 → 资格 → 选餐 → 组餐 →
//       落库 → 通知 → 汇总)
// 单元状态机: PENDING → CONTEXT_BUILT → COMPOSED → PERSISTED
//             任一环节失败 → FAILED (终态)
// 红线: 单元失败必须隔离, 绝不中断整批; 每个单元的结果
//       (成功或失败) 都进入汇总, 不允许静默丢弃
// ==========================================

use crate::config::OrderingConfig;
use crate::domain::order::TrayOrderDraft;
use crate::domain::outcome::{
    MealOrderOutcome, OrderingRunSummary, SelectionContext,
};
use crate::domain::patient::Patient;
use crate::domain::recipe::Recipe;
use crate::domain::types::{CalorieSource, MealOccasion, ReviewReason, UnitState};
use crate::engine::composer::MealComposer;
use crate::engine::eligibility::EligibilityResolver;
use crate::engine::factors::{FactorPipelineEvaluation, SelectionFactorPipeline};
use crate::engine::meal_window::TimeWindowResolver;
use crate::engine::notification::{OptionalStaffNotifier, ReviewNotification};
use crate::engine::stores::OrderingStores;
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, NaiveDate, Utc};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 组餐失败时的单元失败原因 (对外英文, 入库/入汇总原样展示)
const COMPOSITION_FAILURE_REASON: &str = "Could not compose meal within calorie constraints";

// ==========================================
// OrderingRunOptions - 运行入参
// ==========================================

/// 单次运行的可选项
///
/// - simulated_current_time: 模拟当前时刻 (演练/测试); 缺省取
///   真实 UTC 当前时刻
/// - forced_occasions: 强制处理的餐次列表, 绕过窗口判定;
///   加餐仍会被剔除
#[derive(Debug, Clone, Default)]
pub struct OrderingRunOptions {
    pub simulated_current_time: Option<DateTime<Utc>>,
    pub forced_occasions: Option<Vec<MealOccasion>>,
}

// ==========================================
// RunOrchestrator - 运行编排器
// ==========================================
pub struct RunOrchestrator {
    stores: OrderingStores,
    config: Arc<OrderingConfig>,
    window: TimeWindowResolver,
    eligibility: EligibilityResolver,
    pipeline: SelectionFactorPipeline,
    composer: MealComposer,
    notifier: OptionalStaffNotifier,
}

impl RunOrchestrator {
    /// 创建新的 RunOrchestrator 实例
    ///
    /// 内部组件 (窗口/资格/因子管道/组餐) 由同一份配置构建
    pub fn new(
        stores: OrderingStores,
        config: Arc<OrderingConfig>,
        notifier: OptionalStaffNotifier,
    ) -> Self {
        let window = TimeWindowResolver::new(Arc::clone(&config));
        let eligibility = EligibilityResolver::new(stores.clone(), Arc::clone(&config));
        let pipeline = SelectionFactorPipeline::from_config(&config);
        let composer = MealComposer::new(Arc::clone(&config));
        Self {
            stores,
            config,
            window,
            eligibility,
            pipeline,
            composer,
            notifier,
        }
    }

    /// 执行一次自动订餐运行
    ///
    /// # 规则
    /// 1. 目标日期 = 当前时刻 (真实或模拟) 的 UTC 日期
    /// 2. 待处理餐次: 有强制列表用强制列表 (剔除加餐), 否则按
    ///    订餐窗口判定; 为空时返回空汇总, 不访问任何存储
    /// 3. 餐次按固定顺序处理, 餐次内逐患者处理
    /// 4. 资格查询失败属于运行级错误, 向上传播终止本次运行;
    ///    单元内的任何失败只记入该单元结果
    pub async fn run(
        &self,
        options: OrderingRunOptions,
    ) -> Result<OrderingRunSummary, Box<dyn Error + Send + Sync>> {
        let now = options.simulated_current_time.unwrap_or_else(Utc::now);
        let target_date = now.date_naive();

        let occasions = match &options.forced_occasions {
            Some(forced) => forced
                .iter()
                .copied()
                .filter(|o| *o != MealOccasion::Snack)
                .collect(),
            None => self.window.occasions_due(now),
        };
        if occasions.is_empty() {
            info!(%target_date, "无处于订餐窗口的餐次, 本次运行空转");
            return Ok(OrderingRunSummary::empty(target_date));
        }
        info!(%target_date, ?occasions, simulated = options.simulated_current_time.is_some(), "自动订餐运行开始");

        let mut outcomes: Vec<MealOrderOutcome> = Vec::new();
        for &occasion in &occasions {
            let Some(scheduled_for) = self.window.service_datetime(target_date, occasion) else {
                warn!(%occasion, "餐次无供餐时刻, 跳过");
                continue;
            };

            let needy = self
                .eligibility
                .patients_needing_order(target_date, occasion)
                .await?;
            info!(%occasion, needy = needy.len(), "餐次处理开始");

            let mut created = 0usize;
            for patient in &needy {
                let outcome = self
                    .process_unit(patient, occasion, target_date, scheduled_for)
                    .await;
                if outcome.success {
                    created += 1;
                }
                outcomes.push(outcome);
            }
            info!(%occasion, created, processed = needy.len(), "餐次处理完成");
        }

        let summary = OrderingRunSummary::aggregate(target_date, occasions, outcomes);
        info!(
            %target_date,
            created = summary.orders_created,
            failed = summary.orders_failed,
            requiring_review = summary.orders_requiring_review,
            "自动订餐运行完成"
        );
        Ok(summary)
    }

    /// 处理单个 (患者, 餐次) 单元; 任何失败都折叠进返回的
    /// 单元结果, 本方法自身不返回错误
    async fn process_unit(
        &self,
        patient: &Patient,
        occasion: MealOccasion,
        target_date: NaiveDate,
        scheduled_for: DateTime<Utc>,
    ) -> MealOrderOutcome {
        debug!(
            patient_id = %patient.patient_id,
            %occasion,
            state = %UnitState::Pending,
            "单元处理开始"
        );

        // === 上下文构建 (热量区间 + 菜品目录) ===
        let (context, catalog) = match self
            .build_unit_context(&patient.patient_id, occasion, target_date)
            .await
        {
            Ok(built) => built,
            Err(err) => {
                warn!(
                    patient_id = %patient.patient_id,
                    %occasion,
                    state = %UnitState::Failed,
                    error = %err,
                    "上下文构建失败, 单元终止"
                );
                return MealOrderOutcome {
                    patient_id: patient.patient_id.clone(),
                    patient_name: patient.display_name(),
                    meal_occasion: occasion,
                    scheduled_for,
                    success: false,
                    order_id: None,
                    total_calories: None,
                    failure_reason: Some(err.to_string()),
                    calorie_source: CalorieSource::SystemDefault,
                    review_reasons: Vec::new(),
                    requires_staff_review: true,
                    applied_factors: Vec::new(),
                };
            }
        };
        debug!(
            patient_id = %patient.patient_id,
            %occasion,
            state = %UnitState::ContextBuilt,
            minimum = context.calorie_range.minimum,
            maximum = context.calorie_range.maximum,
            source = %context.calorie_range.source,
            "选餐上下文就绪"
        );

        // === 因子管道 + 组餐 ===
        let FactorPipelineEvaluation {
            scored,
            factor_results,
            mut review_reasons,
            applied_factors,
        } = self.pipeline.evaluate(catalog, &context);
        let meal = self
            .composer
            .compose(scored, &context.calorie_range, factor_results);

        if !meal.meets_constraints {
            // MEAL_CONSTRAINT_NOT_MET 只由本路径产生, 无需去重
            review_reasons.push(ReviewReason::MealConstraintNotMet);
            debug!(
                patient_id = %patient.patient_id,
                %occasion,
                state = %UnitState::Failed,
                "组餐不可行, 单元终止"
            );
            return MealOrderOutcome {
                patient_id: patient.patient_id.clone(),
                patient_name: patient.display_name(),
                meal_occasion: occasion,
                scheduled_for,
                success: false,
                order_id: None,
                total_calories: None,
                failure_reason: Some(COMPOSITION_FAILURE_REASON.to_string()),
                calorie_source: context.calorie_range.source,
                requires_staff_review: self.config.requires_staff_review(&review_reasons),
                review_reasons,
                applied_factors,
            };
        }
        debug!(
            patient_id = %patient.patient_id,
            %occasion,
            state = %UnitState::Composed,
            total_calories = meal.total_calories,
            recipes = meal.recipes.len(),
            "组餐完成"
        );

        // === 原子落库 ===
        let draft = TrayOrderDraft {
            patient_id: patient.patient_id.clone(),
            meal_occasion: occasion,
            service_date: target_date,
            scheduled_for,
            total_calories: meal.total_calories,
            calorie_source: context.calorie_range.source,
            recipe_ids: meal.recipes.iter().map(|r| r.recipe_id.clone()).collect(),
        };
        match self.stores.orders.create_order(&draft).await {
            Ok(order) => {
                debug!(
                    patient_id = %patient.patient_id,
                    %occasion,
                    state = %UnitState::Persisted,
                    order_id = %order.order_id,
                    "订单落库完成"
                );
                let outcome = MealOrderOutcome {
                    patient_id: patient.patient_id.clone(),
                    patient_name: patient.display_name(),
                    meal_occasion: occasion,
                    scheduled_for,
                    success: true,
                    order_id: Some(order.order_id),
                    total_calories: Some(order.total_calories),
                    failure_reason: None,
                    calorie_source: order.calorie_source,
                    requires_staff_review: self.config.requires_staff_review(&review_reasons),
                    review_reasons,
                    applied_factors,
                };
                if outcome.requires_staff_review {
                    self.send_review_notification(&outcome);
                }
                outcome
            }
            Err(err) => {
                warn!(
                    patient_id = %patient.patient_id,
                    %occasion,
                    state = %UnitState::Failed,
                    error = %err,
                    "订单落库失败, 单元终止"
                );
                MealOrderOutcome {
                    patient_id: patient.patient_id.clone(),
                    patient_name: patient.display_name(),
                    meal_occasion: occasion,
                    scheduled_for,
                    success: false,
                    order_id: None,
                    total_calories: None,
                    failure_reason: Some(err.to_string()),
                    calorie_source: context.calorie_range.source,
                    requires_staff_review: self.config.requires_staff_review(&review_reasons),
                    review_reasons,
                    applied_factors,
                }
            }
        }
    }

    /// 构建单元的选餐上下文: 热量区间解析 + 菜品目录读取
    ///
    /// 任一存储读取失败都由调用方按单元隔离处理
    async fn build_unit_context(
        &self,
        patient_id: &str,
        occasion: MealOccasion,
        target_date: NaiveDate,
    ) -> RepositoryResult<(SelectionContext, Vec<Recipe>)> {
        let range = self
            .eligibility
            .resolve_calorie_range(patient_id, target_date)
            .await?;
        let catalog = self.stores.recipes.list_recipes().await?;
        Ok((SelectionContext::new(patient_id, occasion, range), catalog))
    }

    /// 成功落库且带复核原因时发送护理站通知
    ///
    /// 红线: 通知失败只记日志, 不改写已落库订单与单元结果
    fn send_review_notification(&self, outcome: &MealOrderOutcome) {
        let notification = ReviewNotification {
            patient_id: outcome.patient_id.clone(),
            patient_name: outcome.patient_name.clone(),
            order_id: outcome.order_id.clone(),
            meal_occasion: outcome.meal_occasion,
            review_reasons: outcome.review_reasons.clone(),
        };
        if let Err(err) = self.notifier.notify(&notification) {
            warn!(
                patient_id = %outcome.patient_id,
                error = %err,
                "复核通知发送失败"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::TrayOrder;
    use crate::domain::patient::DietOrder;
    use crate::domain::types::RecipeCategory;
    use crate::engine::notification::{NotificationPriority, StaffNotifier};
    use crate::engine::stores::{OrderStore, PatientDirectory, RecipeCatalog};
    use crate::repository::error::RepositoryError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    // ==========================================
    // Mock: 患者目录
    // ==========================================
    struct MockPatientDirectory {
        patients: Vec<Patient>,
        diet_orders: HashMap<String, DietOrder>,
    }

    #[async_trait]
    impl PatientDirectory for MockPatientDirectory {
        async fn list_patients(&self) -> RepositoryResult<Vec<Patient>> {
            Ok(self.patients.clone())
        }

        async fn find_active_diet_order(
            &self,
            patient_id: &str,
        ) -> RepositoryResult<Option<DietOrder>> {
            Ok(self.diet_orders.get(patient_id).cloned())
        }
    }

    // ==========================================
    // Mock: 菜品目录 (可注入读失败)
    // ==========================================
    struct MockRecipeCatalog {
        recipes: Vec<Recipe>,
        fail: bool,
    }

    #[async_trait]
    impl RecipeCatalog for MockRecipeCatalog {
        async fn list_recipes(&self) -> RepositoryResult<Vec<Recipe>> {
            if self.fail {
                return Err(RepositoryError::DatabaseQueryError(
                    "菜品目录不可用".to_string(),
                ));
            }
            Ok(self.recipes.clone())
        }
    }

    // ==========================================
    // Mock: 订单存储 (内存, 真实唯一约束语义)
    // ==========================================
    struct MockOrderStore {
        orders: Mutex<Vec<TrayOrder>>,
        fail_create_for: Option<String>,
    }

    impl MockOrderStore {
        fn count(&self) -> usize {
            self.orders.lock().unwrap().len()
        }

        fn seed(&self, order: TrayOrder) {
            self.orders.lock().unwrap().push(order);
        }
    }

    #[async_trait]
    impl OrderStore for MockOrderStore {
        async fn find_orders(
            &self,
            patient_id: &str,
            occasion: MealOccasion,
            service_date: NaiveDate,
        ) -> RepositoryResult<Vec<TrayOrder>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| {
                    o.patient_id == patient_id
                        && o.meal_occasion == occasion
                        && o.service_date == service_date
                })
                .cloned()
                .collect())
        }

        async fn patients_with_order(
            &self,
            service_date: NaiveDate,
            occasion: MealOccasion,
        ) -> RepositoryResult<HashSet<String>> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| o.service_date == service_date && o.meal_occasion == occasion)
                .map(|o| o.patient_id.clone())
                .collect())
        }

        async fn occasions_ordered(
            &self,
            patient_id: &str,
            service_date: NaiveDate,
        ) -> RepositoryResult<Vec<MealOccasion>> {
            let orders = self.orders.lock().unwrap();
            let mut seen = Vec::new();
            for order in orders
                .iter()
                .filter(|o| o.patient_id == patient_id && o.service_date == service_date)
            {
                if !seen.contains(&order.meal_occasion) {
                    seen.push(order.meal_occasion);
                }
            }
            Ok(seen)
        }

        async fn calories_committed(
            &self,
            patient_id: &str,
            service_date: NaiveDate,
        ) -> RepositoryResult<i32> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| o.patient_id == patient_id && o.service_date == service_date)
                .map(|o| o.total_calories)
                .sum())
        }

        async fn create_order(&self, draft: &TrayOrderDraft) -> RepositoryResult<TrayOrder> {
            if self.fail_create_for.as_deref() == Some(draft.patient_id.as_str()) {
                return Err(RepositoryError::UniqueConstraintViolation(
                    "UNIQUE constraint failed: tray_order.patient_id, tray_order.meal_occasion, tray_order.service_date".to_string(),
                ));
            }
            let mut orders = self.orders.lock().unwrap();
            let duplicate = orders.iter().any(|o| {
                o.patient_id == draft.patient_id
                    && o.meal_occasion == draft.meal_occasion
                    && o.service_date == draft.service_date
            });
            if duplicate {
                return Err(RepositoryError::UniqueConstraintViolation(
                    "UNIQUE constraint failed: tray_order.patient_id, tray_order.meal_occasion, tray_order.service_date".to_string(),
                ));
            }
            let order = TrayOrder {
                order_id: format!("mock-order-{}", orders.len() + 1),
                patient_id: draft.patient_id.clone(),
                meal_occasion: draft.meal_occasion,
                service_date: draft.service_date,
                scheduled_for: draft.scheduled_for,
                total_calories: draft.total_calories,
                calorie_source: draft.calorie_source,
                auto_generated: true,
                created_at: Utc::now(),
            };
            orders.push(order.clone());
            Ok(order)
        }
    }

    // ==========================================
    // Mock: 通知者 (记录型 / 故障型)
    // ==========================================
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<ReviewNotification>>,
    }

    impl StaffNotifier for RecordingNotifier {
        fn notify(
            &self,
            notification: &ReviewNotification,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl StaffNotifier for FailingNotifier {
        fn notify(
            &self,
            _notification: &ReviewNotification,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("通知通道不可用".into())
        }
    }

    // ==========================================
    // 测试数据构造
    // ==========================================
    fn make_patient(id: &str, first_name: &str, last_name: &str) -> Patient {
        Patient {
            patient_id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            room_number: Some("204".to_string()),
            admitted_on: NaiveDate::from_ymd_opt(2025, 5, 1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_diet_order(patient_id: &str, min: i32, max: i32) -> DietOrder {
        DietOrder {
            diet_order_id: format!("do-{}", patient_id),
            patient_id: patient_id.to_string(),
            diet_name: "Regular".to_string(),
            daily_calories_min: Some(min),
            daily_calories_max: Some(max),
            is_active: true,
            effective_on: NaiveDate::from_ymd_opt(2025, 5, 1),
            created_at: Utc::now(),
        }
    }

    fn make_recipe(id: &str, category: RecipeCategory, calories: i32) -> Recipe {
        Recipe {
            recipe_id: id.to_string(),
            name: format!("Recipe {}", id),
            category,
            calories,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// 标准菜单: 组餐后合计 630 kcal, 落在默认区间 [500, 700]
    fn standard_catalog() -> Vec<Recipe> {
        vec![
            make_recipe("e1", RecipeCategory::Entree, 350),
            make_recipe("s1", RecipeCategory::Side, 150),
            make_recipe("b1", RecipeCategory::Beverage, 40),
            make_recipe("d1", RecipeCategory::Dessert, 90),
        ]
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 11, 0, 0).unwrap()
    }

    struct Fixture {
        orchestrator: RunOrchestrator,
        store: Arc<MockOrderStore>,
    }

    fn build_fixture(
        patients: Vec<Patient>,
        diet_orders: HashMap<String, DietOrder>,
        recipes: Vec<Recipe>,
        catalog_fails: bool,
        fail_create_for: Option<String>,
        notifier: OptionalStaffNotifier,
    ) -> Fixture {
        let store = Arc::new(MockOrderStore {
            orders: Mutex::new(Vec::new()),
            fail_create_for,
        });
        let stores = OrderingStores::new(
            Arc::new(MockPatientDirectory {
                patients,
                diet_orders,
            }),
            Arc::new(MockRecipeCatalog {
                recipes,
                fail: catalog_fails,
            }),
            store.clone(),
        );
        let orchestrator =
            RunOrchestrator::new(stores, Arc::new(OrderingConfig::default()), notifier);
        Fixture {
            orchestrator,
            store,
        }
    }

    fn forced(occasions: Vec<MealOccasion>) -> OrderingRunOptions {
        OrderingRunOptions {
            simulated_current_time: Some(noon()),
            forced_occasions: Some(occasions),
        }
    }

    // ==========================================
    // 测试 1: 正常整批运行
    // ==========================================

    #[tokio::test]
    async fn test_run_creates_orders_for_all_needy_patients() {
        let fixture = build_fixture(
            vec![
                make_patient("p1", "Mark", "Johnson"),
                make_patient("p2", "Sophie", "Lee"),
            ],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        assert_eq!(summary.target_date, test_date());
        assert_eq!(summary.occasions_processed, vec![MealOccasion::Lunch]);
        assert_eq!(summary.orders_created, 2);
        assert_eq!(summary.orders_failed, 0);
        assert_eq!(fixture.store.count(), 2);
        for outcome in &summary.outcomes {
            assert!(outcome.success);
            assert_eq!(outcome.total_calories, Some(630));
            assert!(outcome.order_id.is_some());
        }
    }

    #[tokio::test]
    async fn test_window_derived_occasions_at_simulated_time() {
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );

        // 11:00 UTC 处于午餐窗口 [9, 12]
        let summary = fixture
            .orchestrator
            .run(OrderingRunOptions {
                simulated_current_time: Some(noon()),
                forced_occasions: None,
            })
            .await
            .unwrap();

        assert_eq!(summary.occasions_processed, vec![MealOccasion::Lunch]);
        assert_eq!(summary.orders_created, 1);
        let order_time = summary.outcomes[0].scheduled_for;
        assert_eq!(
            order_time,
            Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
        );
    }

    // ==========================================
    // 测试 2: 餐次过滤
    // ==========================================

    #[tokio::test]
    async fn test_snack_stripped_from_forced_occasions() {
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch, MealOccasion::Snack]))
            .await
            .unwrap();

        assert_eq!(summary.occasions_processed, vec![MealOccasion::Lunch]);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| o.meal_occasion != MealOccasion::Snack));
    }

    #[tokio::test]
    async fn test_empty_due_set_skips_stores_entirely() {
        // 全部存储都不应被访问: 任何调用直接 panic
        struct PanickingDirectory;
        #[async_trait]
        impl PatientDirectory for PanickingDirectory {
            async fn list_patients(&self) -> RepositoryResult<Vec<Patient>> {
                unreachable!("空餐次不应访问患者目录")
            }
            async fn find_active_diet_order(
                &self,
                _patient_id: &str,
            ) -> RepositoryResult<Option<DietOrder>> {
                unreachable!("空餐次不应访问患者目录")
            }
        }
        struct PanickingCatalog;
        #[async_trait]
        impl RecipeCatalog for PanickingCatalog {
            async fn list_recipes(&self) -> RepositoryResult<Vec<Recipe>> {
                unreachable!("空餐次不应访问菜品目录")
            }
        }
        struct PanickingStore;
        #[async_trait]
        impl OrderStore for PanickingStore {
            async fn find_orders(
                &self,
                _patient_id: &str,
                _occasion: MealOccasion,
                _service_date: NaiveDate,
            ) -> RepositoryResult<Vec<TrayOrder>> {
                unreachable!("空餐次不应访问订单存储")
            }
            async fn patients_with_order(
                &self,
                _service_date: NaiveDate,
                _occasion: MealOccasion,
            ) -> RepositoryResult<HashSet<String>> {
                unreachable!("空餐次不应访问订单存储")
            }
            async fn occasions_ordered(
                &self,
                _patient_id: &str,
                _service_date: NaiveDate,
            ) -> RepositoryResult<Vec<MealOccasion>> {
                unreachable!("空餐次不应访问订单存储")
            }
            async fn calories_committed(
                &self,
                _patient_id: &str,
                _service_date: NaiveDate,
            ) -> RepositoryResult<i32> {
                unreachable!("空餐次不应访问订单存储")
            }
            async fn create_order(&self, _draft: &TrayOrderDraft) -> RepositoryResult<TrayOrder> {
                unreachable!("空餐次不应访问订单存储")
            }
        }

        let stores = OrderingStores::new(
            Arc::new(PanickingDirectory),
            Arc::new(PanickingCatalog),
            Arc::new(PanickingStore),
        );
        let orchestrator = RunOrchestrator::new(
            stores,
            Arc::new(OrderingConfig::default()),
            OptionalStaffNotifier::none(),
        );

        // 强制列表只含加餐 → 剔除后为空
        let summary = orchestrator
            .run(forced(vec![MealOccasion::Snack]))
            .await
            .unwrap();
        assert!(summary.occasions_processed.is_empty());
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.orders_created, 0);

        // 死区时刻 (02:00) 无任何窗口开启
        let summary = orchestrator
            .run(OrderingRunOptions {
                simulated_current_time: Some(
                    Utc.with_ymd_and_hms(2025, 6, 10, 2, 0, 0).unwrap(),
                ),
                forced_occasions: None,
            })
            .await
            .unwrap();
        assert!(summary.occasions_processed.is_empty());
        assert!(summary.outcomes.is_empty());
    }

    // ==========================================
    // 测试 3: 单元隔离
    // ==========================================

    #[tokio::test]
    async fn test_unique_violation_isolated_to_single_unit() {
        let fixture = build_fixture(
            vec![
                make_patient("p1", "Mark", "Johnson"),
                make_patient("p2", "Sophie", "Lee"),
            ],
            HashMap::new(),
            standard_catalog(),
            false,
            Some("p1".to_string()),
            OptionalStaffNotifier::none(),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        assert_eq!(summary.orders_created, 1);
        assert_eq!(summary.orders_failed, 1);
        let failed = summary
            .outcomes
            .iter()
            .find(|o| o.patient_id == "p1")
            .unwrap();
        assert!(!failed.success);
        assert!(failed
            .failure_reason
            .as_ref()
            .unwrap()
            .contains("UNIQUE constraint failed"));
        let succeeded = summary
            .outcomes
            .iter()
            .find(|o| o.patient_id == "p2")
            .unwrap();
        assert!(succeeded.success);
    }

    #[tokio::test]
    async fn test_catalog_read_failure_isolated_as_context_failure() {
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            Vec::new(),
            true,
            None,
            OptionalStaffNotifier::none(),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        assert_eq!(summary.orders_failed, 1);
        let outcome = &summary.outcomes[0];
        assert!(!outcome.success);
        assert!(outcome
            .failure_reason
            .as_ref()
            .unwrap()
            .contains("菜品目录不可用"));
        assert_eq!(outcome.calorie_source, CalorieSource::SystemDefault);
        assert!(outcome.review_reasons.is_empty());
        assert!(outcome.requires_staff_review);
        assert_eq!(fixture.store.count(), 0);
    }

    #[tokio::test]
    async fn test_composition_failure_records_constraint_reason() {
        // 医嘱区间 [300, 600] 三餐次均摊后为 [100, 200],
        // 主菜预算 120 放不下 350 kcal 主菜
        let mut diet_orders = HashMap::new();
        diet_orders.insert("p1".to_string(), make_diet_order("p1", 300, 600));
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            diet_orders,
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        assert_eq!(summary.orders_failed, 1);
        let outcome = &summary.outcomes[0];
        assert!(!outcome.success);
        assert_eq!(
            outcome.failure_reason.as_deref(),
            Some("Could not compose meal within calorie constraints")
        );
        assert!(outcome
            .review_reasons
            .contains(&ReviewReason::MealConstraintNotMet));
        assert_eq!(outcome.calorie_source, CalorieSource::DietOrder);
        assert_eq!(fixture.store.count(), 0);
    }

    // ==========================================
    // 测试 4: 既有订单与幂等性
    // ==========================================

    #[tokio::test]
    async fn test_existing_order_excludes_patient_per_occasion_only() {
        let fixture = build_fixture(
            vec![
                make_patient("p1", "Mark", "Johnson"),
                make_patient("p2", "Sophie", "Lee"),
            ],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );
        // p1 已有当日午餐订单
        fixture.store.seed(TrayOrder {
            order_id: "existing-1".to_string(),
            patient_id: "p1".to_string(),
            meal_occasion: MealOccasion::Lunch,
            service_date: test_date(),
            scheduled_for: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
            total_calories: 600,
            calorie_source: CalorieSource::SystemDefault,
            auto_generated: false,
            created_at: Utc::now(),
        });

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch, MealOccasion::Dinner]))
            .await
            .unwrap();

        // 午餐只处理 p2; 晚餐两人都处理
        assert_eq!(summary.outcomes.len(), 3);
        assert!(summary
            .outcomes
            .iter()
            .all(|o| !(o.patient_id == "p1" && o.meal_occasion == MealOccasion::Lunch)));
        assert!(summary
            .outcomes
            .iter()
            .any(|o| o.patient_id == "p1" && o.meal_occasion == MealOccasion::Dinner));
        assert_eq!(summary.orders_created, 3);
    }

    #[tokio::test]
    async fn test_second_run_creates_no_new_orders() {
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::none(),
        );

        let first = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();
        assert_eq!(first.orders_created, 1);

        let second = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();
        assert_eq!(second.orders_created, 0);
        assert_eq!(second.outcomes.len(), 0);
        assert_eq!(fixture.store.count(), 1);
    }

    // ==========================================
    // 测试 5: 复核与通知
    // ==========================================

    #[tokio::test]
    async fn test_system_default_outcome_flags_review_and_notifies() {
        let recording = Arc::new(RecordingNotifier::default());
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::with_notifier(recording.clone()),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        let outcome = &summary.outcomes[0];
        assert!(outcome.success);
        assert_eq!(outcome.calorie_source, CalorieSource::SystemDefault);
        assert!(outcome.requires_staff_review);
        assert!(outcome
            .review_reasons
            .contains(&ReviewReason::DefaultCalorieConstraints));
        // 停用的安全因子同样进入复核原因
        assert!(outcome
            .review_reasons
            .contains(&ReviewReason::MissingAllergyData));
        assert_eq!(summary.orders_requiring_review, 1);
        assert_eq!(
            summary.review_reason_counts[&ReviewReason::DefaultCalorieConstraints],
            1
        );

        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].patient_name, "Mark Johnson");
        assert_eq!(sent[0].order_id.as_deref(), Some("mock-order-1"));
        assert_eq!(sent[0].priority(), NotificationPriority::Urgent);
    }

    #[tokio::test]
    async fn test_notifier_failure_leaves_outcome_untouched() {
        let fixture = build_fixture(
            vec![make_patient("p1", "Mark", "Johnson")],
            HashMap::new(),
            standard_catalog(),
            false,
            None,
            OptionalStaffNotifier::with_notifier(Arc::new(FailingNotifier)),
        );

        let summary = fixture
            .orchestrator
            .run(forced(vec![MealOccasion::Lunch]))
            .await
            .unwrap();

        assert_eq!(summary.orders_created, 1);
        let outcome = &summary.outcomes[0];
        assert!(outcome.success);
        assert!(outcome.order_id.is_some());
        assert_eq!(fixture.store.count(), 1);
    }
}
