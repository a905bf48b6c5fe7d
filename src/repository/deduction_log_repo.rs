// ==========================================
// 餐厅后厨库存决策系统 - 扣减审计仓储
// ==========================================
// 红线: 落库必留痕,审计表只增不改
// ==========================================

use crate::domain::deduction::DeductionLogEntry;
use crate::domain::types::{SourceType, TriggerType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .unwrap_or_else(|_| chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc())
}

// ==========================================
// DeductionLogRepository - 扣减审计仓储
// ==========================================

/// 扣减审计仓储
/// 职责: 管理 deduction_log 表的追加与查询
pub struct DeductionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeductionLogRepository {
    /// 创建新的审计仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<DeductionLogEntry> {
        let trigger_str: String = row.get(1)?;
        let trigger_type = TriggerType::from_str(&trigger_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("无效的 trigger_type: {}", trigger_str).into(),
            )
        })?;
        let root_type = row
            .get::<_, Option<String>>(2)?
            .and_then(|s| SourceType::from_str(&s));

        Ok(DeductionLogEntry {
            log_id: row.get(0)?,
            trigger_type,
            root_type,
            root_id: row.get(3)?,
            quantity: row.get(4)?,
            blocking_overridden: row.get::<_, i64>(5)? != 0,
            detail: row.get(6)?,
            operator: row.get(7)?,
            created_at: parse_datetime(&row.get::<_, String>(8)?),
        })
    }

    /// 追加一条审计记录
    pub fn insert(&self, entry: &DeductionLogEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO deduction_log (
                log_id, trigger_type, root_type, root_id, quantity,
                blocking_overridden, detail, operator, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.log_id,
                entry.trigger_type.to_db_str(),
                entry.root_type.map(|t| t.to_db_str()),
                entry.root_id,
                entry.quantity,
                entry.blocking_overridden as i64,
                entry.detail,
                entry.operator,
                entry.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 查询最近 N 条审计记录 (新到旧)
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<DeductionLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, trigger_type, root_type, root_id, quantity,
                   blocking_overridden, detail, operator, created_at
            FROM deduction_log
            ORDER BY created_at DESC, log_id DESC
            LIMIT ?1
            "#,
        )?;
        let entries = stmt
            .query_map(params![limit as i64], Self::map_row)?
            .collect::<SqliteResult<Vec<DeductionLogEntry>>>()?;
        Ok(entries)
    }

    /// 按根实体查询审计记录
    pub fn find_by_root(&self, root_id: &str) -> RepositoryResult<Vec<DeductionLogEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, trigger_type, root_type, root_id, quantity,
                   blocking_overridden, detail, operator, created_at
            FROM deduction_log
            WHERE root_id = ?1
            ORDER BY created_at DESC
            "#,
        )?;
        let entries = stmt
            .query_map(params![root_id], Self::map_row)?
            .collect::<SqliteResult<Vec<DeductionLogEntry>>>()?;
        Ok(entries)
    }
}
