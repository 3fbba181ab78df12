// ==========================================
// 智能膳食订餐系统 - 配置层
// ==========================================
// 职责: 订餐配置值对象 (一次构建, 运行期只读)
// ==========================================

pub mod ordering_config;

// 重导出核心配置类型
pub use ordering_config::{
    CategoryTargetShares, CompositionRules, FactorSettings, OrderingConfig,
    SelectionFactorTable, ServiceHours,
};
