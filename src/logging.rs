// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 红线: 日志一律写 stderr, stdout 留给运行汇总 JSON
//       (定时任务靠重定向 stdout 采集汇总)
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化运行日志
///
/// 过滤级别由 RUST_LOG 控制, 未设置时默认 info;
/// RUST_LOG=smart_meal_ordering=debug 可观察单元状态
/// 流转明细
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试环境日志: debug 级别, 输出并入测试捕获
///
/// 重复调用安全 (集成测试多个用例各自调用)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
