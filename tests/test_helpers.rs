// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、实体构建与场景种子
// ==========================================
#![allow(dead_code)]

use chrono::Utc;
use restaurant_inventory_dss::api::RecipeApi;
use restaurant_inventory_dss::db::{configure_sqlite_connection, init_schema};
use restaurant_inventory_dss::domain::ingredient::{CompositeRecipeLine, Ingredient};
use restaurant_inventory_dss::domain::product::{Product, ProductRecipeLine};
use restaurant_inventory_dss::domain::types::SourceType;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接 (API/仓储装配用)
pub fn shared_connection(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = restaurant_inventory_dss::db::open_sqlite_connection(db_path)
        .expect("Failed to open test db");
    Arc::new(Mutex::new(conn))
}

// ==========================================
// 实体构建器
// ==========================================

pub fn make_ingredient(id: &str, name: &str, unit_cost: f64, quantity_on_hand: f64) -> Ingredient {
    let now = Utc::now().naive_utc();
    Ingredient {
        ingredient_id: id.to_string(),
        name: name.to_string(),
        code: id.to_string(),
        unit: "g".to_string(),
        unit_cost,
        quantity_on_hand,
        is_composite: false,
        batch_size: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_composite(id: &str, name: &str, quantity_on_hand: f64, batch_size: f64) -> Ingredient {
    Ingredient {
        is_composite: true,
        batch_size: Some(batch_size),
        unit_cost: 0.0,
        ..make_ingredient(id, name, 0.0, quantity_on_hand)
    }
}

pub fn make_product(id: &str, name: &str, selling_price: f64) -> Product {
    let now = Utc::now().naive_utc();
    Product {
        product_id: id.to_string(),
        name: name.to_string(),
        category: "主食".to_string(),
        selling_price,
        created_at: now,
        updated_at: now,
    }
}

pub fn composite_line(
    composite_id: &str,
    line_no: i32,
    base_id: &str,
    quantity_per_batch: f64,
) -> CompositeRecipeLine {
    CompositeRecipeLine {
        composite_id: composite_id.to_string(),
        line_no,
        base_ingredient_id: base_id.to_string(),
        quantity_per_batch,
        unit: "g".to_string(),
    }
}

pub fn product_line(
    product_id: &str,
    line_no: i32,
    source_type: SourceType,
    source_id: &str,
    quantity: f64,
) -> ProductRecipeLine {
    ProductRecipeLine {
        product_id: product_id.to_string(),
        line_no,
        source_type,
        source_id: source_id.to_string(),
        quantity,
        unit: "g".to_string(),
    }
}

// ==========================================
// 披萨场景种子
// ==========================================
// 基础食材 + 自制披萨酱 (批次 128, 番茄膏每批 96) +
// 披萨/米饭产品 + 双人套餐 (产品嵌套一层)
pub fn seed_pizza_scenario(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let recipe_api = RecipeApi::from_connection(conn).map_err(|e| e.to_string())?;

    recipe_api.save_ingredient(&make_ingredient("ING001", "面团", 0.008, 20_000.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING002", "芝士", 0.06, 8_000.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING003", "番茄膏", 0.015, 5_000.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING004", "橄榄油", 0.04, 3_000.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING005", "盐", 0.002, 2_000.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING006", "罗勒", 0.12, 500.0))?;
    recipe_api.save_ingredient(&make_ingredient("ING007", "米饭", 0.005, 15_000.0))?;

    recipe_api.save_ingredient(&make_composite("ING100", "披萨酱", 1_000.0, 128.0))?;
    recipe_api.save_composite_recipe(
        "ING100",
        &[
            composite_line("ING100", 1, "ING003", 96.0),
            composite_line("ING100", 2, "ING004", 20.0),
            composite_line("ING100", 3, "ING005", 4.0),
        ],
    )?;

    recipe_api.save_product(&make_product("PRD001", "玛格丽特披萨", 48.0))?;
    recipe_api.save_product_recipe(
        "PRD001",
        &[
            product_line("PRD001", 1, SourceType::Ingredient, "ING001", 250.0),
            product_line("PRD001", 2, SourceType::Ingredient, "ING002", 80.0),
            product_line("PRD001", 3, SourceType::Ingredient, "ING100", 4.0),
            product_line("PRD001", 4, SourceType::Ingredient, "ING006", 3.0),
        ],
    )?;

    recipe_api.save_product(&make_product("PRD002", "米饭单品", 3.0))?;
    recipe_api.save_product_recipe(
        "PRD002",
        &[product_line("PRD002", 1, SourceType::Ingredient, "ING007", 200.0)],
    )?;

    recipe_api.save_product(&make_product("PRD100", "双人套餐", 88.0))?;
    recipe_api.save_product_recipe(
        "PRD100",
        &[
            product_line("PRD100", 1, SourceType::Product, "PRD001", 1.0),
            product_line("PRD100", 2, SourceType::Product, "PRD002", 2.0),
        ],
    )?;

    Ok(())
}

/// 查询食材当前库存量
pub fn quantity_on_hand(conn: &Arc<Mutex<Connection>>, ingredient_id: &str) -> f64 {
    let guard = conn.lock().unwrap();
    guard
        .query_row(
            "SELECT quantity_on_hand FROM ingredient WHERE ingredient_id = ?1",
            [ingredient_id],
            |row| row.get(0),
        )
        .expect("ingredient not found")
}

/// 浮点近似断言
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
