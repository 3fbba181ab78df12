// ==========================================
// 智能膳食订餐系统 - 患者目录仓储
// ==========================================
// 红线: 引擎侧只读; insert 仅服务于数据同步与测试装配
// ==========================================

use crate::domain::patient::{DietOrder, Patient};
use crate::engine::stores::PatientDirectory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PatientRepository - 患者目录仓储
// ==========================================
pub struct PatientRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PatientRepository {
    /// 创建新的 PatientRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入患者记录
    pub fn insert(&self, patient: &Patient) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO patient (
                    patient_id, first_name, last_name, room_number,
                    admitted_on, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &patient.patient_id,
                &patient.first_name,
                &patient.last_name,
                &patient.room_number,
                patient
                    .admitted_on
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                &patient.created_at,
                &patient.updated_at,
            ],
        )?;
        Ok(patient.patient_id.clone())
    }

    /// 按 ID 查询患者
    pub fn find_by_id(&self, patient_id: &str) -> RepositoryResult<Option<Patient>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT patient_id, first_name, last_name, room_number,
                      admitted_on, created_at, updated_at
               FROM patient
               WHERE patient_id = ?"#,
        )?;

        let mut rows = stmt.query_map(params![patient_id], Self::map_patient_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 列出全部患者（按姓名排序, 保证处理顺序稳定）
    pub fn list_all(&self) -> RepositoryResult<Vec<Patient>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT patient_id, first_name, last_name, room_number,
                      admitted_on, created_at, updated_at
               FROM patient
               ORDER BY last_name, first_name, patient_id"#,
        )?;

        let patients = stmt
            .query_map([], Self::map_patient_row)?
            .collect::<Result<Vec<Patient>, _>>()?;
        Ok(patients)
    }

    /// 写入医嘱膳食记录
    pub fn insert_diet_order(&self, order: &DietOrder) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO diet_order (
                    diet_order_id, patient_id, diet_name,
                    daily_calories_min, daily_calories_max,
                    is_active, effective_on, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &order.diet_order_id,
                &order.patient_id,
                &order.diet_name,
                &order.daily_calories_min,
                &order.daily_calories_max,
                if order.is_active { 1 } else { 0 },
                order
                    .effective_on
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                &order.created_at,
            ],
        )?;
        Ok(order.diet_order_id.clone())
    }

    /// 查询患者当前生效的医嘱膳食（取最新一条）
    pub fn find_active_diet_order_for(
        &self,
        patient_id: &str,
    ) -> RepositoryResult<Option<DietOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT diet_order_id, patient_id, diet_name,
                      daily_calories_min, daily_calories_max,
                      is_active, effective_on, created_at
               FROM diet_order
               WHERE patient_id = ? AND is_active = 1
               ORDER BY created_at DESC
               LIMIT 1"#,
        )?;

        let mut rows = stmt.query_map(params![patient_id], Self::map_diet_order_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn map_patient_row(row: &rusqlite::Row) -> rusqlite::Result<Patient> {
        Ok(Patient {
            patient_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            room_number: row.get(3)?,
            admitted_on: parse_opt_date(row, 4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn map_diet_order_row(row: &rusqlite::Row) -> rusqlite::Result<DietOrder> {
        Ok(DietOrder {
            diet_order_id: row.get(0)?,
            patient_id: row.get(1)?,
            diet_name: row.get(2)?,
            daily_calories_min: row.get(3)?,
            daily_calories_max: row.get(4)?,
            is_active: row.get::<_, i32>(5)? == 1,
            effective_on: parse_opt_date(row, 6)?,
            created_at: row.get(7)?,
        })
    }
}

/// 解析可空的 YYYY-MM-DD 文本列
fn parse_opt_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
        None => Ok(None),
    }
}

// ==========================================
// PatientDirectory 实现
// ==========================================
#[async_trait]
impl PatientDirectory for PatientRepository {
    async fn list_patients(&self) -> RepositoryResult<Vec<Patient>> {
        self.list_all()
    }

    async fn find_active_diet_order(
        &self,
        patient_id: &str,
    ) -> RepositoryResult<Option<DietOrder>> {
        self.find_active_diet_order_for(patient_id)
    }
}
