// ==========================================
// 餐厅后厨库存决策系统 - 复合食材配方仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 配方整体替换在单个事务内完成 (删旧行 + 插新行)
// ==========================================

use crate::domain::ingredient::CompositeRecipeLine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CompositeRecipeRepository - 复合食材配方仓储
// ==========================================

/// 复合食材配方仓储
/// 职责: 管理 composite_recipe_line 表
pub struct CompositeRecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompositeRecipeRepository {
    /// 创建新的配方仓储实例
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

    fn map_row(row: &Row<'_>) -> SqliteResult<CompositeRecipeLine> {
        Ok(CompositeRecipeLine {
            composite_id: row.get(0)?,
            line_no: row.get(1)?,
            base_ingredient_id: row.get(2)?,
            quantity_per_batch: row.get(3)?,
            unit: row.get(4)?,
        })
    }

    /// 查询某复合食材的全部配方行
    pub fn lines_for(&self, composite_id: &str) -> RepositoryResult<Vec<CompositeRecipeLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT composite_id, line_no, base_ingredient_id, quantity_per_batch, unit
            FROM composite_recipe_line
            WHERE composite_id = ?1
            ORDER BY line_no
            "#,
        )?;
        let lines = stmt
            .query_map(params![composite_id], Self::map_row)?
            .collect::<SqliteResult<Vec<CompositeRecipeLine>>>()?;
        Ok(lines)
    }

    /// 查询全部配方行 (目录快照装载用)
    pub fn list_all(&self) -> RepositoryResult<Vec<CompositeRecipeLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT composite_id, line_no, base_ingredient_id, quantity_per_batch, unit
            FROM composite_recipe_line
            ORDER BY composite_id, line_no
            "#,
        )?;
        let lines = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<CompositeRecipeLine>>>()?;
        Ok(lines)
    }

    /// 整体替换某复合食材的配方 (单个事务)
    pub fn replace_lines(
        &self,
        composite_id: &str,
        lines: &[CompositeRecipeLine],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| -> RepositoryResult<usize> {
            conn.execute(
                "DELETE FROM composite_recipe_line WHERE composite_id = ?1",
                params![composite_id],
            )?;

            let mut inserted = 0;
            for line in lines {
                inserted += conn.execute(
                    r#"
                    INSERT INTO composite_recipe_line (
                        composite_id, line_no, base_ingredient_id, quantity_per_batch, unit
                    ) VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        composite_id,
                        line.line_no,
                        line.base_ingredient_id,
                        line.quantity_per_batch,
                        line.unit,
                    ],
                )?;
            }
            Ok(inserted)
        })();

        match result {
            Ok(inserted) => {
                conn.execute("COMMIT", [])?;
                Ok(inserted)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}
