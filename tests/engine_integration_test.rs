// ==========================================
// 引擎层集成测试
// ==========================================
// 测试目标: 从数据库装载目录快照后的解析/换算/成本计算
// ==========================================

mod test_helpers;

use restaurant_inventory_dss::domain::types::SourceType;
use restaurant_inventory_dss::engine::{BatchScaler, CostCalculator, RecipeResolver};
use restaurant_inventory_dss::logging;
use restaurant_inventory_dss::repository::CatalogRepository;
use test_helpers::*;

#[test]
fn test_resolve_pizza_through_composite_sauce() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog = CatalogRepository::from_connection(conn).load_full().unwrap();
    let resolver = RecipeResolver::new();

    // 一份披萨: 酱 4ml, 批次 128, 番茄膏每批 96 -> 4/128*96 = 3.0
    let bom = resolver
        .resolve(&catalog, SourceType::Product, "PRD001", 1.0)
        .unwrap();

    assert_close(bom.requirement("ING001"), 250.0); // 面团
    assert_close(bom.requirement("ING002"), 80.0); // 芝士
    assert_close(bom.requirement("ING003"), 3.0); // 番茄膏 (经酱展开)
    assert_close(bom.requirement("ING004"), 0.625); // 橄榄油
    assert_close(bom.requirement("ING005"), 0.125); // 盐
    assert_close(bom.requirement("ING006"), 3.0); // 罗勒
    // 结果只含基础食材
    assert_close(bom.requirement("ING100"), 0.0);
}

#[test]
fn test_resolve_nested_combo_product() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog = CatalogRepository::from_connection(conn).load_full().unwrap();
    let resolver = RecipeResolver::new();

    // 双人套餐 = 披萨 1 + 米饭 2
    let bom = resolver
        .resolve(&catalog, SourceType::Product, "PRD100", 2.0)
        .unwrap();

    assert_close(bom.requirement("ING001"), 500.0); // 2 份披萨的面团
    assert_close(bom.requirement("ING007"), 800.0); // 2*2 份米饭
}

#[test]
fn test_scale_factor_one_returns_per_batch_quantities() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog = CatalogRepository::from_connection(conn).load_full().unwrap();
    let scaler = BatchScaler::new();

    // 需求量恰为批次产出量: 换算系数 1,每行原样返回
    let scaled = scaler.scale(&catalog, "ING100", 128.0).unwrap();
    assert_close(*scaled.get("ING003").unwrap(), 96.0);
    assert_close(*scaled.get("ING004").unwrap(), 20.0);
    assert_close(*scaled.get("ING005").unwrap(), 4.0);
}

#[test]
fn test_scale_linearity() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog = CatalogRepository::from_connection(conn).load_full().unwrap();
    let scaler = BatchScaler::new();

    let q1 = 24.0;
    let q2 = 40.0;
    let combined = scaler.scale(&catalog, "ING100", q1 + q2).unwrap();
    let part1 = scaler.scale(&catalog, "ING100", q1).unwrap();
    let part2 = scaler.scale(&catalog, "ING100", q2).unwrap();

    for (ingredient_id, total) in &combined {
        let sum = part1.get(ingredient_id).unwrap() + part2.get(ingredient_id).unwrap();
        assert_close(*total, sum);
    }
}

#[test]
fn test_cost_recomputed_from_base_ingredient_prices() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog = CatalogRepository::from_connection(conn).load_full().unwrap();
    let calculator = CostCalculator::new();

    // 披萨酱派生单价 = (96*0.015 + 20*0.04 + 4*0.002) / 128
    let sauce_unit_cost = calculator
        .total_cost(&catalog, SourceType::Ingredient, "ING100")
        .unwrap();
    assert_close(sauce_unit_cost, 2.248 / 128.0);

    // 披萨成本 = 面团 + 芝士 + 酱(派生) + 罗勒
    let pizza_cost = calculator
        .total_cost(&catalog, SourceType::Product, "PRD001")
        .unwrap();
    let expected = 250.0 * 0.008 + 80.0 * 0.06 + 4.0 * sauce_unit_cost + 3.0 * 0.12;
    assert_close(pizza_cost, expected);

    // 套餐成本 = 披萨 + 2 * 米饭
    let combo_cost = calculator
        .total_cost(&catalog, SourceType::Product, "PRD100")
        .unwrap();
    assert_close(combo_cost, pizza_cost + 2.0 * 200.0 * 0.005);
}
