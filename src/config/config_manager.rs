// ==========================================
// 餐厅后厨库存决策系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::resolver::{ResolvePolicy, DEFAULT_MAX_PRODUCT_DEPTH};
use crate::engine::warning::DEFAULT_LOW_STOCK_RATIO;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值 (公开方法,供其他模块复用)
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照 (JSON格式)
    ///
    /// # 用途
    /// - 扣减审计记录中保留当时生效的阈值配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 库存告警配置 =====

    /// 获取低库存阈值比例
    ///
    /// # 返回
    /// - f64: 阈值比例 (默认 0.10 = 10%)
    ///
    /// # 说明
    /// 扣减后库存低于 当前库存 × 比例 时产生 INFO 告警;
    /// 配置不存在或格式错误时回退默认值
    pub fn get_low_stock_ratio(&self) -> Result<f64, Box<dyn Error>> {
        let value =
            self.get_config_or_default(config_keys::LOW_STOCK_RATIO, &DEFAULT_LOW_STOCK_RATIO.to_string())?;
        Ok(value.parse::<f64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::LOW_STOCK_RATIO,
                raw_value = %value,
                "低库存阈值配置格式错误,使用默认值"
            );
            DEFAULT_LOW_STOCK_RATIO
        }))
    }

    // ===== 配方展开配置 =====

    /// 获取产品嵌套深度上限
    pub fn get_max_product_depth(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::MAX_PRODUCT_DEPTH,
            &DEFAULT_MAX_PRODUCT_DEPTH.to_string(),
        )?;
        Ok(value.parse::<usize>().unwrap_or(DEFAULT_MAX_PRODUCT_DEPTH))
    }

    /// 获取复合食材嵌套深度上限
    ///
    /// # 返回
    /// - None: 不设限 (默认; 展开引擎的环检查兜底)
    /// - Some(n): 超过 n 层即拒绝
    pub fn get_composite_depth_limit(&self) -> Result<Option<usize>, Box<dyn Error>> {
        match self.get_config_value(config_keys::COMPOSITE_DEPTH_LIMIT)? {
            Some(value) => Ok(value.parse::<usize>().ok()),
            None => Ok(None),
        }
    }

    /// 组装展开策略 (解析引擎的配置入口)
    pub fn get_resolve_policy(&self) -> Result<ResolvePolicy, Box<dyn Error>> {
        Ok(ResolvePolicy {
            max_product_depth: self.get_max_product_depth()?,
            composite_depth_limit: self.get_composite_depth_limit()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 库存告警
    pub const LOW_STOCK_RATIO: &str = "deduction/low_stock_ratio";

    // 配方展开
    pub const MAX_PRODUCT_DEPTH: &str = "recipe/max_product_depth";
    pub const COMPOSITE_DEPTH_LIMIT: &str = "recipe/composite_depth_limit";
}
