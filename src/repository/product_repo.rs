// ==========================================
// 餐厅后厨库存决策系统 - 产品数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::product::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .unwrap_or_else(|_| chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc())
}

// ==========================================
// ProductRepository - 产品仓储
// ==========================================

/// 产品仓储
/// 职责: 管理 product 表的 CRUD 操作
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的产品仓储实例
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

    fn map_row(row: &Row<'_>) -> SqliteResult<Product> {
        Ok(Product {
            product_id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            selling_price: row.get(3)?,
            created_at: parse_datetime(&row.get::<_, String>(4)?),
            updated_at: parse_datetime(&row.get::<_, String>(5)?),
        })
    }

    /// 按ID查询产品
    pub fn find_by_id(&self, product_id: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, name, category, selling_price, created_at, updated_at
            FROM product
            WHERE product_id = ?1
            "#,
        )?;
        let product = stmt.query_row(params![product_id], Self::map_row).optional()?;
        Ok(product)
    }

    /// 查询全部产品
    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_id, name, category, selling_price, created_at, updated_at
            FROM product
            ORDER BY product_id
            "#,
        )?;
        let products = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Product>>>()?;
        Ok(products)
    }

    /// 插入或更新产品
    pub fn upsert(&self, product: &Product) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO product (
                product_id, name, category, selling_price, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                product.product_id,
                product.name,
                product.category,
                product.selling_price,
                product.created_at.format(DATETIME_FMT).to_string(),
                product.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 产品是否被其他产品的配方行引用
    pub fn is_referenced(&self, product_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let referenced: bool = conn
            .query_row(
                r#"
                SELECT 1 FROM product_recipe_line
                WHERE source_type = 'PRODUCT' AND source_id = ?1
                LIMIT 1
                "#,
                params![product_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(referenced)
    }

    /// 删除产品 (连带其配方行)
    ///
    /// 红线: 被其他产品配方引用的产品不可删除
    pub fn delete(&self, product_id: &str) -> RepositoryResult<()> {
        if self.is_referenced(product_id)? {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "产品 {} 仍被其他产品配方引用,不可删除",
                product_id
            )));
        }

        let conn = self.get_conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;
        let result = (|| -> RepositoryResult<usize> {
            conn.execute(
                "DELETE FROM product_recipe_line WHERE product_id = ?1",
                params![product_id],
            )?;
            let affected = conn.execute(
                "DELETE FROM product WHERE product_id = ?1",
                params![product_id],
            )?;
            Ok(affected)
        })();

        match result {
            Ok(0) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(RepositoryError::NotFound {
                    entity: "Product".to_string(),
                    id: product_id.to_string(),
                })
            }
            Ok(_) => {
                conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}
