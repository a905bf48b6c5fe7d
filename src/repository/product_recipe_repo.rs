// ==========================================
// 餐厅后厨库存决策系统 - 产品配方仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// source_type 以 SCREAMING_SNAKE_CASE 字符串落库
// ==========================================

use crate::domain::product::ProductRecipeLine;
use crate::domain::types::SourceType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ProductRecipeRepository - 产品配方仓储
// ==========================================

/// 产品配方仓储
/// 职责: 管理 product_recipe_line 表
pub struct ProductRecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRecipeRepository {
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

    fn map_row(row: &Row<'_>) -> SqliteResult<ProductRecipeLine> {
        let source_type_str: String = row.get(2)?;
        let source_type = SourceType::from_str(&source_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("无效的 source_type: {}", source_type_str).into(),
            )
        })?;

        Ok(ProductRecipeLine {
            product_id: row.get(0)?,
            line_no: row.get(1)?,
            source_type,
            source_id: row.get(3)?,
            quantity: row.get(4)?,
            unit: row.get(5)?,
        })
    }

    /// 查询某产品的全部配方行
    pub fn lines_for(&self, product_id: &str) -> RepositoryResult<Vec<ProductRecipeLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, line_no, source_type, source_id, quantity, unit
            FROM product_recipe_line
            WHERE product_id = ?1
            ORDER BY line_no
            "#,
        )?;
        let lines = stmt
            .query_map(params![product_id], Self::map_row)?
            .collect::<SqliteResult<Vec<ProductRecipeLine>>>()?;
        Ok(lines)
    }

    /// 查询全部配方行 (目录快照装载用)
    pub fn list_all(&self) -> RepositoryResult<Vec<ProductRecipeLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, line_no, source_type, source_id, quantity, unit
            FROM product_recipe_line
            ORDER BY product_id, line_no
            "#,
        )?;
        let lines = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<ProductRecipeLine>>>()?;
        Ok(lines)
    }

    /// 整体替换某产品的配方 (单个事务)
    pub fn replace_lines(
        &self,
        product_id: &str,
        lines: &[ProductRecipeLine],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| -> RepositoryResult<usize> {
            conn.execute(
                "DELETE FROM product_recipe_line WHERE product_id = ?1",
                params![product_id],
            )?;

            let mut inserted = 0;
            for line in lines {
                inserted += conn.execute(
                    r#"
                    INSERT INTO product_recipe_line (
                        product_id, line_no, source_type, source_id, quantity, unit
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        product_id,
                        line.line_no,
                        line.source_type.to_db_str(),
                        line.source_id,
                        line.quantity,
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
