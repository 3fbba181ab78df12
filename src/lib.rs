// ==========================================
// 智能膳食订餐系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite (rusqlite) + tokio
// 系统定位: 决策支持系统 (自动成单, 人工保留最终控制权;
//           缺数据时宁可标记复核, 不做臆断)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CalorieSource, MealOccasion, RecipeCategory, ReviewReason, UnitState};

// 领域实体
pub use domain::{
    CalorieRange, ComposedMeal, DietOrder, MealOrderOutcome, OrderingRunSummary, Patient, Recipe,
    TrayOrder, TrayOrderDraft,
};

// 配置
pub use config::OrderingConfig;

// 引擎
pub use engine::{
    EligibilityResolver, LoggingStaffNotifier, MealComposer, OptionalStaffNotifier,
    OrderingRunOptions, OrderingStores, RunOrchestrator, SelectionFactorPipeline, StaffNotifier,
    TimeWindowResolver,
};

// 仓储
pub use repository::{PatientRepository, RecipeRepository, TrayOrderRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称 (启动日志与通知落款)
pub const APP_NAME: &str = "智能膳食订餐系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
