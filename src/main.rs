// ==========================================
// 餐厅后厨库存决策系统 - 运维 CLI 入口
// ==========================================
// 子命令: init-db / status / preview-sale / import-sales
// 前端仪表盘为外部协作方,本入口仅覆盖运维与排查场景
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use restaurant_inventory_dss::api::{ApplyMode, InventoryApi, SalesApi};
use restaurant_inventory_dss::db;
use restaurant_inventory_dss::logging;

fn usage() -> String {
    [
        "用法:",
        "  restaurant-inventory-dss init-db [db_path]",
        "  restaurant-inventory-dss status [db_path]",
        "  restaurant-inventory-dss preview-sale <product_id> <quantity> [db_path]",
        "  restaurant-inventory-dss import-sales <file> [db_path] [--force]",
    ]
    .join("\n")
}

fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<rusqlite::Connection>>> {
    let conn = db::open_sqlite_connection(db_path)
        .with_context(|| format!("打开数据库失败: {}", db_path))?;
    Ok(Arc::new(Mutex::new(conn)))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let force = args.iter().any(|a| a == "--force");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let command = positional
        .first()
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("{}", usage()))?;

    tracing::info!("==================================================");
    tracing::info!("{}", restaurant_inventory_dss::APP_NAME);
    tracing::info!("系统版本: {}", restaurant_inventory_dss::VERSION);
    tracing::info!("==================================================");

    match command {
        "init-db" => {
            let db_path = positional
                .get(1)
                .map(|s| s.to_string())
                .unwrap_or_else(db::get_default_db_path);
            let conn = db::open_sqlite_connection(&db_path)?;
            db::init_schema(&conn)?;
            tracing::info!(db_path = %db_path, "数据库初始化完成");
        }

        "status" => {
            let db_path = positional
                .get(1)
                .map(|s| s.to_string())
                .unwrap_or_else(db::get_default_db_path);
            let conn = open_shared_connection(&db_path)?;

            let schema_version = {
                let guard = conn.lock().map_err(|e| anyhow!("锁获取失败: {}", e))?;
                db::read_schema_version(&guard)?
            };
            tracing::info!(db_path = %db_path, schema_version = ?schema_version, "数据库状态");

            let inventory = InventoryApi::from_connection(conn)
                .map_err(|e| anyhow!("组装库存API失败: {}", e))?;
            let summary = inventory
                .stock_health_summary()
                .map_err(|e| anyhow!("{}", e))?;
            tracing::info!(
                total = summary.total,
                negative = summary.negative,
                depleted = summary.depleted,
                healthy = summary.healthy,
                "库存健康概览"
            );
        }

        "preview-sale" => {
            let product_id = positional
                .get(1)
                .ok_or_else(|| anyhow!("缺少产品ID\n{}", usage()))?;
            let quantity: f64 = positional
                .get(2)
                .ok_or_else(|| anyhow!("缺少数量\n{}", usage()))?
                .parse()
                .context("数量必须为数字")?;
            let db_path = positional
                .get(3)
                .map(|s| s.to_string())
                .unwrap_or_else(db::get_default_db_path);

            let conn = open_shared_connection(&db_path)?;
            let inventory = InventoryApi::from_connection(conn)
                .map_err(|e| anyhow!("组装库存API失败: {}", e))?;

            let preview = inventory
                .preview_sale(product_id, quantity)
                .map_err(|e| anyhow!("{}", e))?;

            for projection in &preview.projections {
                tracing::info!(
                    ingredient = %projection.ingredient_name,
                    current = projection.current_quantity,
                    required = projection.required_quantity,
                    proposed = projection.proposed_quantity,
                    "库存推演"
                );
            }
            for warning in &preview.report.warnings {
                tracing::warn!(
                    ingredient = %warning.ingredient_name,
                    severity = %warning.severity,
                    "{}",
                    warning.message
                );
            }
            tracing::info!(blocking = preview.report.blocking, "扣减预览完成 (未落库)");
        }

        "import-sales" => {
            let file = positional
                .get(1)
                .ok_or_else(|| anyhow!("缺少销售文件路径\n{}", usage()))?;
            let db_path = positional
                .get(2)
                .map(|s| s.to_string())
                .unwrap_or_else(db::get_default_db_path);

            let conn = open_shared_connection(&db_path)?;
            let sales = SalesApi::from_connection(conn)
                .map_err(|e| anyhow!("组装销售API失败: {}", e))?;

            let mode = if force {
                ApplyMode::ForceOverride
            } else {
                ApplyMode::Normal
            };
            let response = sales
                .import_sales_file(file.as_str(), mode, "cli")
                .await
                .map_err(|e| anyhow!("{}", e))?;

            for row_error in &response.row_errors {
                tracing::warn!(row = row_error.row, "{}", row_error.message);
            }
            match response.outcome {
                Some(outcome) => tracing::info!(
                    log_id = %outcome.log_id,
                    updated = outcome.updated_ingredients,
                    blocking_overridden = outcome.blocking_overridden,
                    "销售导入已落库"
                ),
                None => tracing::warn!("销售文件无有效行,未落库"),
            }
        }

        other => {
            return Err(anyhow!("未知子命令: {}\n{}", other, usage()));
        }
    }

    Ok(())
}
