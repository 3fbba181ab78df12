// ==========================================
// 智能膳食订餐系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表语句集中在此，测试与生产共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等, IF NOT EXISTS）
///
/// 表清单:
/// - patient / diet_order: 患者目录（只读协作方的本地镜像）
/// - recipe: 菜品目录
/// - tray_order / tray_order_recipe: 订单及菜品关联
///
/// 红线: tray_order 的 (patient_id, meal_occasion, service_date)
/// 唯一约束是并发幂等性的唯一保障, 不得移除
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS patient (
            patient_id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            room_number TEXT,
            admitted_on TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS diet_order (
            diet_order_id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL REFERENCES patient(patient_id) ON DELETE CASCADE,
            diet_name TEXT NOT NULL,
            daily_calories_min INTEGER,
            daily_calories_max INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            effective_on TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_diet_order_patient
            ON diet_order(patient_id, is_active);

        CREATE TABLE IF NOT EXISTS recipe (
            recipe_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            calories INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tray_order (
            order_id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL REFERENCES patient(patient_id),
            meal_occasion TEXT NOT NULL,
            service_date TEXT NOT NULL,
            scheduled_for TEXT NOT NULL,
            total_calories INTEGER NOT NULL,
            calorie_source TEXT NOT NULL,
            auto_generated INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (patient_id, meal_occasion, service_date)
        );

        CREATE INDEX IF NOT EXISTS idx_tray_order_date_occasion
            ON tray_order(service_date, meal_occasion);

        CREATE TABLE IF NOT EXISTS tray_order_recipe (
            order_id TEXT NOT NULL REFERENCES tray_order(order_id) ON DELETE CASCADE,
            recipe_id TEXT NOT NULL REFERENCES recipe(recipe_id),
            quantity INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (order_id, recipe_id)
        );
        "#,
    )?;
    Ok(())
}

/// 默认数据库路径（平台数据目录下）
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smart-meal-ordering")
        .join("meal_ordering.db")
}
