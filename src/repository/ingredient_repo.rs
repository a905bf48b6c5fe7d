// ==========================================
// 餐厅后厨库存决策系统 - 食材数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 库存扣减必须在单个事务内完成 (避免并发销售的丢失更新)
// ==========================================

use crate::domain::ingredient::Ingredient;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 时间戳存储格式
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .unwrap_or_else(|_| chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc())
}

// ==========================================
// IngredientRepository - 食材仓储
// ==========================================

/// 食材仓储
/// 职责: 管理 ingredient 表的 CRUD 与库存变更
pub struct IngredientRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IngredientRepository {
    /// 创建新的食材仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Ingredient> {
        Ok(Ingredient {
            ingredient_id: row.get(0)?,
            name: row.get(1)?,
            code: row.get(2)?,
            unit: row.get(3)?,
            unit_cost: row.get(4)?,
            quantity_on_hand: row.get(5)?,
            is_composite: row.get::<_, i64>(6)? != 0,
            batch_size: row.get(7)?,
            created_at: parse_datetime(&row.get::<_, String>(8)?),
            updated_at: parse_datetime(&row.get::<_, String>(9)?),
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        ingredient_id, name, code, unit, unit_cost, quantity_on_hand,
        is_composite, batch_size, created_at, updated_at
    "#;

    /// 按ID查询食材
    pub fn find_by_id(&self, ingredient_id: &str) -> RepositoryResult<Option<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ingredient WHERE ingredient_id = ?1",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let ingredient = stmt
            .query_row(params![ingredient_id], Self::map_row)
            .optional()?;
        Ok(ingredient)
    }

    /// 按编码查询食材 (销售文件导入匹配用)
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ingredient WHERE code = ?1", Self::SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let ingredient = stmt.query_row(params![code], Self::map_row).optional()?;
        Ok(ingredient)
    }

    /// 查询全部食材
    pub fn list_all(&self) -> RepositoryResult<Vec<Ingredient>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ingredient ORDER BY ingredient_id",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let ingredients = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Ingredient>>>()?;
        Ok(ingredients)
    }

    /// 插入或更新食材
    pub fn upsert(&self, ingredient: &Ingredient) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO ingredient (
                ingredient_id, name, code, unit, unit_cost, quantity_on_hand,
                is_composite, batch_size, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                ingredient.ingredient_id,
                ingredient.name,
                ingredient.code,
                ingredient.unit,
                ingredient.unit_cost,
                ingredient.quantity_on_hand,
                ingredient.is_composite as i64,
                ingredient.batch_size,
                ingredient.created_at.format(DATETIME_FMT).to_string(),
                ingredient.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 直接设置库存量 (盘点校正)
    pub fn set_quantity(&self, ingredient_id: &str, quantity: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
        let affected = conn.execute(
            "UPDATE ingredient SET quantity_on_hand = ?2, updated_at = ?3 WHERE ingredient_id = ?1",
            params![ingredient_id, quantity, now],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Ingredient".to_string(),
                id: ingredient_id.to_string(),
            });
        }
        Ok(())
    }

    /// 在单个事务内按增减量批量更新库存
    ///
    /// # 参数
    /// - deltas: 食材ID -> 扣减量 (正数扣减,负数入库)
    ///
    /// # 返回
    /// - Ok(usize): 更新的记录数
    /// - Err(NotFound): 任一食材不存在,整个事务回滚
    ///
    /// # 说明
    /// 使用 BEGIN IMMEDIATE + 原地 UPDATE,保证并发销售下
    /// "读当前量-计算新量-写回" 不产生丢失更新
    pub fn apply_deltas(&self, deltas: &HashMap<String, f64>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])?;

        let result = (|| -> RepositoryResult<usize> {
            let mut updated = 0;
            for (ingredient_id, delta) in deltas {
                let affected = conn.execute(
                    r#"
                    UPDATE ingredient
                    SET quantity_on_hand = quantity_on_hand - ?2, updated_at = ?3
                    WHERE ingredient_id = ?1
                    "#,
                    params![ingredient_id, delta, now],
                )?;
                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "Ingredient".to_string(),
                        id: ingredient_id.clone(),
                    });
                }
                updated += affected;
            }
            Ok(updated)
        })();

        match result {
            Ok(updated) => {
                conn.execute("COMMIT", [])?;
                Ok(updated)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// 食材是否被任何配方行引用
    pub fn is_referenced(&self, ingredient_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let in_composite: bool = conn
            .query_row(
                "SELECT 1 FROM composite_recipe_line WHERE base_ingredient_id = ?1 LIMIT 1",
                params![ingredient_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if in_composite {
            return Ok(true);
        }

        let in_product: bool = conn
            .query_row(
                r#"
                SELECT 1 FROM product_recipe_line
                WHERE source_type = 'INGREDIENT' AND source_id = ?1
                LIMIT 1
                "#,
                params![ingredient_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(in_product)
    }

    /// 删除食材
    ///
    /// 红线: 被配方引用的食材不可删除
    pub fn delete(&self, ingredient_id: &str) -> RepositoryResult<()> {
        if self.is_referenced(ingredient_id)? {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "食材 {} 仍被配方引用,不可删除",
                ingredient_id
            )));
        }

        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM ingredient WHERE ingredient_id = ?1",
            params![ingredient_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Ingredient".to_string(),
                id: ingredient_id.to_string(),
            });
        }
        Ok(())
    }
}
