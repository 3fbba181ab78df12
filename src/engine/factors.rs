// ==========================================
// 智能膳食订餐系统 - 选餐因子管道
// ==========================================
// 职责: 按固定优先级运行可插拔的过滤/评分/复核因子
// 顺序: 安全因子 (过敏, 质地) → 运行因子 (热量) → 偏好因子 (宗教饮食)
// 红线: 过滤只许收窄候选池; 停用因子必须报复核
//       (数据缺失按不安全处理, 不得默认放行)
// ==========================================

mod calorie_constraint;
mod pipeline;
mod stubs;

#[cfg(test)]
mod tests;

pub use calorie_constraint::CalorieConstraintFactor;
pub use pipeline::{FactorPipelineEvaluation, SelectionFactor, SelectionFactorPipeline};
pub use stubs::{AllergySafetyFactor, ReligiousDietaryFactor, TextureModificationFactor};
