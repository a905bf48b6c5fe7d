// ==========================================
// 餐厅后厨库存决策系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供建库入口 init_schema,供 CLI / 种子工具 / 测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明:
/// - 版本号用于提示/告警 (不做自动迁移),避免静默在旧库上运行导致隐性错误
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
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

/// 读取 schema_version (若表不存在则返回 None)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先使用系统数据目录,不可用时退回当前目录
pub fn get_default_db_path() -> String {
    match dirs::data_dir() {
        Some(dir) => dir
            .join("restaurant-inventory-dss")
            .join("inventory.db")
            .to_string_lossy()
            .to_string(),
        None => "inventory.db".to_string(),
    }
}

/// 初始化数据库 schema (幂等)
///
/// 建表 + 写入 schema_version + 建立 global 配置作用域
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS ingredient (
            ingredient_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            unit TEXT NOT NULL,
            unit_cost REAL NOT NULL DEFAULT 0,
            quantity_on_hand REAL NOT NULL DEFAULT 0,
            is_composite INTEGER NOT NULL DEFAULT 0,
            batch_size REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS composite_recipe_line (
            composite_id TEXT NOT NULL REFERENCES ingredient(ingredient_id),
            line_no INTEGER NOT NULL,
            base_ingredient_id TEXT NOT NULL REFERENCES ingredient(ingredient_id),
            quantity_per_batch REAL NOT NULL,
            unit TEXT NOT NULL,
            PRIMARY KEY (composite_id, line_no)
        );

        CREATE TABLE IF NOT EXISTS product (
            product_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            selling_price REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_recipe_line (
            product_id TEXT NOT NULL REFERENCES product(product_id),
            line_no INTEGER NOT NULL,
            source_type TEXT NOT NULL,
            source_id TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit TEXT NOT NULL,
            PRIMARY KEY (product_id, line_no)
        );

        CREATE TABLE IF NOT EXISTS deduction_log (
            log_id TEXT PRIMARY KEY,
            trigger_type TEXT NOT NULL,
            root_type TEXT,
            root_id TEXT,
            quantity REAL,
            blocking_overridden INTEGER NOT NULL DEFAULT 0,
            detail TEXT NOT NULL,
            operator TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_composite_line_base
            ON composite_recipe_line(base_ingredient_id);
        CREATE INDEX IF NOT EXISTS idx_product_line_source
            ON product_recipe_line(source_type, source_id);
        CREATE INDEX IF NOT EXISTS idx_deduction_log_created
            ON deduction_log(created_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    conn.execute(
        r#"
        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global')
        "#,
        [],
    )?;

    Ok(())
}
