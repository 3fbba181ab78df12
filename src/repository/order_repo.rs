// ==========================================
// 智能膳食订餐系统 - 餐盘订单仓储
// ==========================================
// 职责: 订单与菜品关联的唯一写入口
// 红线: 订单行 + 关联行同事务写入; UNIQUE 冲突原样上抛,
//       由编排器按"该单元已被并发订餐"处理
// ==========================================

use crate::domain::order::{TrayOrder, TrayOrderDraft};
use crate::domain::types::{CalorieSource, MealOccasion};
use crate::engine::stores::OrderStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// TrayOrderRepository - 餐盘订单仓储
// ==========================================
pub struct TrayOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TrayOrderRepository {
    /// 创建新的 TrayOrderRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 原子创建订单及菜品关联
    ///
    /// order_id 与 created_at 在此生成; 任一环节失败则整体回滚。
    /// 同 (患者, 餐次, 日期) 的重复提交由唯一约束拦截,
    /// 上抛 UniqueConstraintViolation。
    pub fn create_with_recipes(&self, draft: &TrayOrderDraft) -> RepositoryResult<TrayOrder> {
        let order_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO tray_order (
                    order_id, patient_id, meal_occasion, service_date,
                    scheduled_for, total_calories, calorie_source,
                    auto_generated, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &order_id,
                &draft.patient_id,
                draft.meal_occasion.to_db_str(),
                draft.service_date.format("%Y-%m-%d").to_string(),
                &draft.scheduled_for,
                draft.total_calories,
                draft.calorie_source.to_db_str(),
                1, // 本仓储只承接自动订餐产出
                &created_at,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO tray_order_recipe (order_id, recipe_id, quantity)
                   VALUES (?, ?, ?)"#,
            )?;

            for recipe_id in &draft.recipe_ids {
                stmt.execute(params![&order_id, recipe_id, 1])?;
            }
        }

        tx.commit()?;

        Ok(TrayOrder {
            order_id,
            patient_id: draft.patient_id.clone(),
            meal_occasion: draft.meal_occasion,
            service_date: draft.service_date,
            scheduled_for: draft.scheduled_for,
            total_calories: draft.total_calories,
            calorie_source: draft.calorie_source,
            auto_generated: true,
            created_at,
        })
    }

    /// 查询某患者在指定日期 + 餐次下的订单
    pub fn find_by_patient_occasion_date(
        &self,
        patient_id: &str,
        occasion: MealOccasion,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<TrayOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT order_id, patient_id, meal_occasion, service_date,
                      scheduled_for, total_calories, calorie_source,
                      auto_generated, created_at
               FROM tray_order
               WHERE patient_id = ? AND meal_occasion = ? AND service_date = ?"#,
        )?;

        let orders = stmt
            .query_map(
                params![
                    patient_id,
                    occasion.to_db_str(),
                    service_date.format("%Y-%m-%d").to_string(),
                ],
                Self::map_row,
            )?
            .collect::<Result<Vec<TrayOrder>, _>>()?;
        Ok(orders)
    }

    /// 指定日期 + 餐次下已持有订单的患者 ID 集合
    pub fn patient_ids_with_order(
        &self,
        service_date: NaiveDate,
        occasion: MealOccasion,
    ) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT DISTINCT patient_id
               FROM tray_order
               WHERE service_date = ? AND meal_occasion = ?"#,
        )?;

        let ids = stmt
            .query_map(
                params![
                    service_date.format("%Y-%m-%d").to_string(),
                    occasion.to_db_str(),
                ],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    /// 患者当日已订餐次列表
    pub fn occasions_ordered_on(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<MealOccasion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT DISTINCT meal_occasion
               FROM tray_order
               WHERE patient_id = ? AND service_date = ?"#,
        )?;

        let occasions = stmt
            .query_map(
                params![patient_id, service_date.format("%Y-%m-%d").to_string()],
                |row| {
                    let raw: String = row.get(0)?;
                    MealOccasion::from_str(&raw).ok_or_else(|| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            format!("未知餐次: {}", raw).into(),
                        )
                    })
                },
            )?
            .collect::<Result<Vec<MealOccasion>, _>>()?;
        Ok(occasions)
    }

    /// 患者当日已提交订单的热量合计
    ///
    /// 口径: 关联菜品热量 × 份数求和, 而非订单表的冗余合计列
    pub fn calories_committed_on(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let total: i32 = conn.query_row(
            r#"SELECT COALESCE(SUM(r.calories * tor.quantity), 0)
               FROM tray_order t
               JOIN tray_order_recipe tor ON tor.order_id = t.order_id
               JOIN recipe r ON r.recipe_id = tor.recipe_id
               WHERE t.patient_id = ? AND t.service_date = ?"#,
            params![patient_id, service_date.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 查询订单关联的菜品 ID 列表 (按写入顺序)
    pub fn find_recipe_ids(&self, order_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT recipe_id FROM tray_order_recipe
               WHERE order_id = ?
               ORDER BY rowid"#,
        )?;

        let ids = stmt
            .query_map(params![order_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<TrayOrder> {
        let occasion_str: String = row.get(2)?;
        let occasion = MealOccasion::from_str(&occasion_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("未知餐次: {}", occasion_str).into(),
            )
        })?;

        let date_str: String = row.get(3)?;
        let service_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let source_str: String = row.get(6)?;

        Ok(TrayOrder {
            order_id: row.get(0)?,
            patient_id: row.get(1)?,
            meal_occasion: occasion,
            service_date,
            scheduled_for: row.get(4)?,
            total_calories: row.get(5)?,
            calorie_source: CalorieSource::from_str(&source_str),
            auto_generated: row.get::<_, i32>(7)? == 1,
            created_at: row.get(8)?,
        })
    }
}

// ==========================================
// OrderStore 实现
// ==========================================
#[async_trait]
impl OrderStore for TrayOrderRepository {
    async fn find_orders(
        &self,
        patient_id: &str,
        occasion: MealOccasion,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<TrayOrder>> {
        self.find_by_patient_occasion_date(patient_id, occasion, service_date)
    }

    async fn patients_with_order(
        &self,
        service_date: NaiveDate,
        occasion: MealOccasion,
    ) -> RepositoryResult<HashSet<String>> {
        self.patient_ids_with_order(service_date, occasion)
    }

    async fn occasions_ordered(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<Vec<MealOccasion>> {
        self.occasions_ordered_on(patient_id, service_date)
    }

    async fn calories_committed(
        &self,
        patient_id: &str,
        service_date: NaiveDate,
    ) -> RepositoryResult<i32> {
        self.calories_committed_on(patient_id, service_date)
    }

    async fn create_order(&self, draft: &TrayOrderDraft) -> RepositoryResult<TrayOrder> {
        self.create_with_recipes(draft)
    }
}
