// ==========================================
// 餐厅后厨库存决策系统 - 演示数据种子工具
// ==========================================
// 用法: seed_demo_data [db_path]
// 场景: 基础食材 + 自制披萨酱 (批次配方) + 披萨/套餐产品
// ==========================================

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use restaurant_inventory_dss::api::RecipeApi;
use restaurant_inventory_dss::config::{config_keys, ConfigManager};
use restaurant_inventory_dss::db::{get_default_db_path, init_schema, open_sqlite_connection};
use restaurant_inventory_dss::domain::ingredient::{CompositeRecipeLine, Ingredient};
use restaurant_inventory_dss::domain::product::{Product, ProductRecipeLine};
use restaurant_inventory_dss::domain::types::SourceType;

fn ingredient(
    id: &str,
    name: &str,
    code: &str,
    unit: &str,
    unit_cost: f64,
    quantity_on_hand: f64,
) -> Ingredient {
    let now = Utc::now().naive_utc();
    Ingredient {
        ingredient_id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        unit: unit.to_string(),
        unit_cost,
        quantity_on_hand,
        is_composite: false,
        batch_size: None,
        created_at: now,
        updated_at: now,
    }
}

fn composite(
    id: &str,
    name: &str,
    code: &str,
    unit: &str,
    quantity_on_hand: f64,
    batch_size: f64,
) -> Ingredient {
    Ingredient {
        is_composite: true,
        batch_size: Some(batch_size),
        // 复合食材无采购单价,成本由配方派生
        unit_cost: 0.0,
        ..ingredient(id, name, code, unit, 0.0, quantity_on_hand)
    }
}

fn product(id: &str, name: &str, category: &str, selling_price: f64) -> Product {
    let now = Utc::now().naive_utc();
    Product {
        product_id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        selling_price,
        created_at: now,
        updated_at: now,
    }
}

fn composite_line(
    composite_id: &str,
    line_no: i32,
    base_id: &str,
    quantity_per_batch: f64,
    unit: &str,
) -> CompositeRecipeLine {
    CompositeRecipeLine {
        composite_id: composite_id.to_string(),
        line_no,
        base_ingredient_id: base_id.to_string(),
        quantity_per_batch,
        unit: unit.to_string(),
    }
}

fn product_line(
    product_id: &str,
    line_no: i32,
    source_type: SourceType,
    source_id: &str,
    quantity: f64,
    unit: &str,
) -> ProductRecipeLine {
    ProductRecipeLine {
        product_id: product_id.to_string(),
        line_no,
        source_type,
        source_id: source_id.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    restaurant_inventory_dss::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    // 已有库先备份再重建,种子结果保持可复现
    if Path::new(&db_path).exists() {
        let backup = format!("{}.bak", db_path);
        fs::copy(&db_path, &backup)?;
        fs::remove_file(&db_path)?;
        tracing::info!(backup = %backup, "原数据库已备份");
    }
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    let conn = Arc::new(Mutex::new(conn));
    let recipe_api = RecipeApi::from_connection(conn.clone())?;
    let config = ConfigManager::from_connection(conn)?;

    // ===== 基础食材 =====
    recipe_api.save_ingredient(&ingredient("ING001", "面团", "DOUGH", "g", 0.008, 20_000.0))?;
    recipe_api.save_ingredient(&ingredient("ING002", "马苏里拉芝士", "MOZZ", "g", 0.06, 8_000.0))?;
    recipe_api.save_ingredient(&ingredient("ING003", "番茄膏", "PASTE", "ml", 0.015, 5_000.0))?;
    recipe_api.save_ingredient(&ingredient("ING004", "橄榄油", "OIL", "ml", 0.04, 3_000.0))?;
    recipe_api.save_ingredient(&ingredient("ING005", "盐", "SALT", "g", 0.002, 2_000.0))?;
    recipe_api.save_ingredient(&ingredient("ING006", "罗勒", "BASIL", "g", 0.12, 500.0))?;
    recipe_api.save_ingredient(&ingredient("ING007", "米饭", "RICE", "g", 0.005, 15_000.0))?;

    // ===== 复合食材: 自制披萨酱 (一批产出 128 ml) =====
    recipe_api.save_ingredient(&composite("ING100", "披萨酱", "PIZZA-SAUCE", "ml", 1_000.0, 128.0))?;
    recipe_api.save_composite_recipe(
        "ING100",
        &[
            composite_line("ING100", 1, "ING003", 96.0, "ml"),
            composite_line("ING100", 2, "ING004", 20.0, "ml"),
            composite_line("ING100", 3, "ING005", 4.0, "g"),
        ],
    )?;

    // ===== 产品 =====
    recipe_api.save_product(&product("PRD001", "玛格丽特披萨", "主食", 48.0))?;
    recipe_api.save_product_recipe(
        "PRD001",
        &[
            product_line("PRD001", 1, SourceType::Ingredient, "ING001", 250.0, "g"),
            product_line("PRD001", 2, SourceType::Ingredient, "ING002", 80.0, "g"),
            product_line("PRD001", 3, SourceType::Ingredient, "ING100", 4.0, "ml"),
            product_line("PRD001", 4, SourceType::Ingredient, "ING006", 3.0, "g"),
        ],
    )?;

    recipe_api.save_product(&product("PRD002", "米饭单品", "主食", 3.0))?;
    recipe_api.save_product_recipe(
        "PRD002",
        &[product_line("PRD002", 1, SourceType::Ingredient, "ING007", 200.0, "g")],
    )?;

    // 套餐: 披萨 + 米饭 (产品嵌套一层)
    recipe_api.save_product(&product("PRD100", "双人套餐", "套餐", 88.0))?;
    recipe_api.save_product_recipe(
        "PRD100",
        &[
            product_line("PRD100", 1, SourceType::Product, "PRD001", 1.0, "份"),
            product_line("PRD100", 2, SourceType::Product, "PRD002", 2.0, "份"),
        ],
    )?;

    // ===== 默认配置 =====
    config.set_global_config_value(config_keys::LOW_STOCK_RATIO, "0.10")?;
    config.set_global_config_value(config_keys::MAX_PRODUCT_DEPTH, "2")?;

    tracing::info!(db_path = %db_path, "演示数据已生成");
    tracing::info!("试一试: restaurant-inventory-dss preview-sale PRD100 2 {}", db_path);

    Ok(())
}
