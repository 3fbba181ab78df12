// ==========================================
// 智能膳食订餐系统 - 引擎层
// ==========================================
// 职责: 实现订餐业务规则 (窗口/资格/选餐/组餐/编排/通知)
// 红线: Engine 不拼 SQL, 数据读写一律走 stores 接口;
//       所有过滤与失败都必须输出 reason
// ==========================================

pub mod composer;
pub mod eligibility;
pub mod eligibility_core;
pub mod factors;
pub mod meal_window;
pub mod notification;
pub mod orchestrator;
pub mod stores;

// 重导出核心引擎
pub use composer::MealComposer;
pub use eligibility::EligibilityResolver;
pub use eligibility_core::EligibilityCore;
pub use factors::{
    CalorieConstraintFactor, FactorPipelineEvaluation, SelectionFactor, SelectionFactorPipeline,
};
pub use meal_window::TimeWindowResolver;
pub use notification::{
    LoggingStaffNotifier, NoOpStaffNotifier, NotificationPriority, OptionalStaffNotifier,
    ReviewNotification, StaffNotifier,
};
pub use orchestrator::{OrderingRunOptions, RunOrchestrator};
pub use stores::{OrderStore, OrderingStores, PatientDirectory, RecipeCatalog};
