// ==========================================
// 智能膳食订餐系统 - CLI 主入口
// ==========================================
// 用途: 单次自动订餐运行 (定时任务/人工触发均走这里)
// 输出: 运行汇总 JSON 写 stdout; 日志走 stderr (tracing)
// ==========================================

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use smart_meal_ordering::config::OrderingConfig;
use smart_meal_ordering::db;
use smart_meal_ordering::domain::types::MealOccasion;
use smart_meal_ordering::engine::{
    LoggingStaffNotifier, OptionalStaffNotifier, OrderingRunOptions, OrderingStores,
    RunOrchestrator,
};
use smart_meal_ordering::logging;
use smart_meal_ordering::repository::{PatientRepository, RecipeRepository, TrayOrderRepository};
use std::sync::{Arc, Mutex};

struct CliArgs {
    db_path: Option<String>,
    simulated_time: Option<DateTime<Utc>>,
    occasions: Vec<MealOccasion>,
}

fn print_usage() {
    println!("用法: smart-meal-ordering [选项]");
    println!();
    println!("选项:");
    println!("  --db <路径>                SQLite 数据库路径 (缺省: 平台数据目录)");
    println!("  --simulated-time <RFC3339> 模拟当前时刻, 如 2025-06-10T11:00:00Z");
    println!("  --occasion <餐次>          强制处理的餐次, 可重复 (BREAKFAST/LUNCH/DINNER)");
    println!("  -h, --help                 显示本帮助");
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        db_path: None,
        simulated_time: None,
        occasions: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = args.next().context("--db 需要一个路径参数")?;
                parsed.db_path = Some(value);
            }
            "--simulated-time" => {
                let value = args
                    .next()
                    .context("--simulated-time 需要一个 RFC3339 时刻参数")?;
                let time = DateTime::parse_from_rfc3339(&value)
                    .with_context(|| format!("无法解析模拟时刻: {}", value))?;
                parsed.simulated_time = Some(time.with_timezone(&Utc));
            }
            "--occasion" => {
                let value = args.next().context("--occasion 需要一个餐次名参数")?;
                let occasion = MealOccasion::from_str(&value)
                    .with_context(|| format!("未知餐次: {}", value))?;
                parsed.occasions.push(occasion);
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => bail!("未知参数: {} (使用 --help 查看用法)", other),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = parse_args()?;

    let db_path = match args.db_path {
        Some(path) => path,
        None => db::default_db_path().to_string_lossy().into_owned(),
    };
    tracing::info!(
        version = smart_meal_ordering::VERSION,
        %db_path,
        "{} 启动",
        smart_meal_ordering::APP_NAME
    );

    let conn = db::open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    db::init_schema(&conn).context("初始化数据库表结构失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let stores = OrderingStores::new(
        Arc::new(PatientRepository::new(Arc::clone(&conn))),
        Arc::new(RecipeRepository::new(Arc::clone(&conn))),
        Arc::new(TrayOrderRepository::new(conn)),
    );
    let config = Arc::new(OrderingConfig::default());
    let notifier = OptionalStaffNotifier::with_notifier(Arc::new(LoggingStaffNotifier));
    let orchestrator = RunOrchestrator::new(stores, config, notifier);

    let options = OrderingRunOptions {
        simulated_current_time: args.simulated_time,
        forced_occasions: if args.occasions.is_empty() {
            None
        } else {
            Some(args.occasions)
        },
    };

    let summary = orchestrator
        .run(options)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("自动订餐运行失败")?;

    tracing::info!(
        created = summary.orders_created,
        failed = summary.orders_failed,
        requiring_review = summary.orders_requiring_review,
        "运行结束"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
