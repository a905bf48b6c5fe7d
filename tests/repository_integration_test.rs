// ==========================================
// 仓储层集成测试
// ==========================================
// 测试目标: CRUD、单事务批量扣减、引用保护删除
// ==========================================

mod test_helpers;

use restaurant_inventory_dss::domain::deduction::DeductionLogEntry;
use restaurant_inventory_dss::domain::types::{SourceType, TriggerType};
use restaurant_inventory_dss::logging;
use restaurant_inventory_dss::repository::{
    CatalogRepository, CompositeRecipeRepository, DeductionLogRepository, IngredientRepository,
    ProductRecipeRepository, ProductRepository, RepositoryError,
};
use std::collections::HashMap;
use test_helpers::*;

#[test]
fn test_ingredient_upsert_and_find() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    let repo = IngredientRepository::from_connection(conn);

    let ingredient = make_ingredient("ING001", "面团", 0.008, 1000.0);
    repo.upsert(&ingredient).unwrap();

    let found = repo.find_by_id("ING001").unwrap().unwrap();
    assert_eq!(found.name, "面团");
    assert_eq!(found.quantity_on_hand, 1000.0);
    assert!(!found.is_composite);

    // 编码唯一,可按编码匹配 (销售导入用)
    let by_code = repo.find_by_code("ING001").unwrap().unwrap();
    assert_eq!(by_code.ingredient_id, "ING001");

    // upsert 幂等覆盖
    let mut updated = found.clone();
    updated.unit_cost = 0.01;
    repo.upsert(&updated).unwrap();
    assert_eq!(repo.find_by_id("ING001").unwrap().unwrap().unit_cost, 0.01);
}

#[test]
fn test_apply_deltas_in_single_transaction() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    let repo = IngredientRepository::from_connection(conn);

    repo.upsert(&make_ingredient("ING001", "面团", 0.008, 100.0)).unwrap();
    repo.upsert(&make_ingredient("ING002", "芝士", 0.06, 50.0)).unwrap();

    let mut deltas = HashMap::new();
    deltas.insert("ING001".to_string(), 30.0);
    deltas.insert("ING002".to_string(), 10.0);

    let updated = repo.apply_deltas(&deltas).unwrap();
    assert_eq!(updated, 2);
    assert_eq!(repo.find_by_id("ING001").unwrap().unwrap().quantity_on_hand, 70.0);
    assert_eq!(repo.find_by_id("ING002").unwrap().unwrap().quantity_on_hand, 40.0);
}

#[test]
fn test_apply_deltas_rolls_back_on_missing_ingredient() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    let repo = IngredientRepository::from_connection(conn);

    repo.upsert(&make_ingredient("ING001", "面团", 0.008, 100.0)).unwrap();

    let mut deltas = HashMap::new();
    deltas.insert("ING001".to_string(), 30.0);
    deltas.insert("GHOST".to_string(), 5.0);

    let result = repo.apply_deltas(&deltas);
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

    // 事务整体回滚: ING001 未被部分扣减
    assert_eq!(repo.find_by_id("ING001").unwrap().unwrap().quantity_on_hand, 100.0);
}

#[test]
fn test_delete_referenced_ingredient_is_refused() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let repo = IngredientRepository::from_connection(conn);

    // 番茄膏被披萨酱配方引用
    let result = repo.delete("ING003");
    assert!(matches!(
        result,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));
    assert!(repo.find_by_id("ING003").unwrap().is_some());

    // 未被引用的食材可删除
    repo.upsert(&make_ingredient("ING999", "孤立食材", 0.01, 10.0)).unwrap();
    repo.delete("ING999").unwrap();
    assert!(repo.find_by_id("ING999").unwrap().is_none());
}

#[test]
fn test_delete_referenced_product_is_refused() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let repo = ProductRepository::from_connection(conn.clone());

    // 披萨被双人套餐引用
    let result = repo.delete("PRD001");
    assert!(matches!(
        result,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));

    // 套餐自身无人引用,删除连带清掉配方行
    repo.delete("PRD100").unwrap();
    assert!(repo.find_by_id("PRD100").unwrap().is_none());
    let line_repo = ProductRecipeRepository::from_connection(conn);
    assert!(line_repo.lines_for("PRD100").unwrap().is_empty());
}

#[test]
fn test_replace_lines_is_whole_swap() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let repo = CompositeRecipeRepository::from_connection(conn);

    // 披萨酱配方从 3 行整体替换为 1 行
    let inserted = repo
        .replace_lines("ING100", &[composite_line("ING100", 1, "ING003", 128.0)])
        .unwrap();
    assert_eq!(inserted, 1);

    let lines = repo.lines_for("ING100").unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].base_ingredient_id, "ING003");
    assert_eq!(lines[0].quantity_per_batch, 128.0);
}

#[test]
fn test_catalog_load_full() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");

    let catalog_repo = CatalogRepository::from_connection(conn);
    let catalog = catalog_repo.load_full().unwrap();

    assert_eq!(catalog.ingredient_count(), 8);
    assert_eq!(catalog.product_count(), 3);
    assert_eq!(catalog.composite_lines("ING100").len(), 3);
    assert_eq!(catalog.product_lines("PRD001").len(), 4);
    assert!(catalog.ingredient("ING100").unwrap().is_composite);
}

#[test]
fn test_deduction_log_append_and_query() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    let repo = DeductionLogRepository::from_connection(conn);

    let entry = DeductionLogEntry {
        log_id: "LOG001".to_string(),
        trigger_type: TriggerType::Sale,
        root_type: Some(SourceType::Product),
        root_id: Some("PRD001".to_string()),
        quantity: Some(2.0),
        blocking_overridden: false,
        detail: r#"{"requirements":{"ING001":500.0}}"#.to_string(),
        operator: Some("tester".to_string()),
        created_at: chrono::Utc::now().naive_utc(),
    };
    repo.insert(&entry).unwrap();

    let recent = repo.list_recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].trigger_type, TriggerType::Sale);
    assert_eq!(recent[0].root_id.as_deref(), Some("PRD001"));
    assert!(!recent[0].blocking_overridden);

    let by_root = repo.find_by_root("PRD001").unwrap();
    assert_eq!(by_root.len(), 1);
    assert_eq!(by_root[0].log_id, "LOG001");
}
