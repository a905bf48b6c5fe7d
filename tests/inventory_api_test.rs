// ==========================================
// 库存 API 集成测试
// ==========================================
// 测试目标: 预览不落库、阻断与人工突破、原子落库 + 审计
// ==========================================

mod test_helpers;

use restaurant_inventory_dss::api::{ApiError, ApplyMode, InventoryApi};
use restaurant_inventory_dss::config::{config_keys, ConfigManager};
use restaurant_inventory_dss::domain::types::{TriggerType, WarningSeverity};
use restaurant_inventory_dss::logging;
use std::sync::{Arc, Mutex};
use test_helpers::*;

fn setup() -> (
    tempfile::NamedTempFile,
    InventoryApi,
    Arc<Mutex<rusqlite::Connection>>,
) {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");
    let api = InventoryApi::from_connection(conn.clone()).expect("Failed to build InventoryApi");
    (temp_file, api, conn)
}

#[test]
fn test_preview_sale_has_no_side_effects() {
    let (_temp_file, api, conn) = setup();

    let before = quantity_on_hand(&conn, "ING001");
    let preview = api.preview_sale("PRD001", 2.0).unwrap();

    // 一份披萨面团 250g,两份 500g
    let bom = preview.bom.as_ref().unwrap();
    assert_close(bom.requirement("ING001"), 500.0);
    assert_close(bom.requirement("ING003"), 6.0); // 经酱展开的番茄膏

    // 预览不落库
    assert_eq!(quantity_on_hand(&conn, "ING001"), before);
    assert!(!preview.report.blocking);
}

#[test]
fn test_apply_sale_deducts_and_logs() {
    let (_temp_file, api, conn) = setup();

    let before = quantity_on_hand(&conn, "ING001");
    let outcome = api
        .apply_sale("PRD001", 2.0, ApplyMode::Normal, "tester")
        .unwrap();

    assert!(outcome.updated_ingredients > 0);
    assert!(!outcome.blocking_overridden);
    assert_close(quantity_on_hand(&conn, "ING001"), before - 500.0);

    // 落库必留痕
    let logs = api.recent_deductions(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].trigger_type, TriggerType::Sale);
    assert_eq!(logs[0].root_id.as_deref(), Some("PRD001"));
    assert_eq!(logs[0].quantity, Some(2.0));
    assert!(logs[0].detail.contains("requirements"));
}

#[test]
fn test_blocking_sale_refused_then_force_overridden() {
    let (_temp_file, api, conn) = setup();

    // 罗勒只剩 500g; 200 份披萨需要 600g,扣减后为负 -> 阻断
    let preview = api.preview_sale("PRD001", 200.0).unwrap();
    assert!(preview.report.blocking);
    assert!(preview
        .report
        .warnings
        .iter()
        .any(|w| w.ingredient_id == "ING006" && w.severity == WarningSeverity::Critical));

    let before = quantity_on_hand(&conn, "ING006");
    let result = api.apply_sale("PRD001", 200.0, ApplyMode::Normal, "tester");
    assert!(matches!(result, Err(ApiError::BlockingNotOverridden(_))));
    // 拒绝时无任何落库
    assert_eq!(quantity_on_hand(&conn, "ING006"), before);
    assert!(api.recent_deductions(10).unwrap().is_empty());

    // 人工突破后落库,审计记录 blocking_overridden
    let outcome = api
        .apply_sale("PRD001", 200.0, ApplyMode::ForceOverride, "tester")
        .unwrap();
    assert!(outcome.blocking_overridden);
    assert_close(quantity_on_hand(&conn, "ING006"), before - 600.0);

    let logs = api.recent_deductions(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].blocking_overridden);
}

#[test]
fn test_manual_adjustment_warning_classification() {
    let (_temp_file, api, conn) = setup();

    // 先把罗勒调到 50,便于构造阈值场景
    api.apply_manual_adjustment("ING006", 50.0, ApplyMode::Normal, "tester", "盘亏校正")
        .unwrap();
    assert_eq!(quantity_on_hand(&conn, "ING006"), 50.0);

    // 50 -> 4: 低于 10% 阈值 (5),INFO 不阻断
    let preview = api.preview_manual_adjustment("ING006", 4.0).unwrap();
    assert!(!preview.report.blocking);
    assert_eq!(preview.report.count_by_severity(WarningSeverity::Info), 1);

    // 50 -> 0: 归零 WARNING 不阻断
    let preview = api.preview_manual_adjustment("ING006", 0.0).unwrap();
    assert!(!preview.report.blocking);
    assert_eq!(preview.report.count_by_severity(WarningSeverity::Warning), 1);

    // 50 -> -10: 负库存 CRITICAL 阻断
    let preview = api.preview_manual_adjustment("ING006", -10.0).unwrap();
    assert!(preview.report.blocking);
    assert_eq!(preview.report.count_by_severity(WarningSeverity::Critical), 1);

    let result =
        api.apply_manual_adjustment("ING006", -10.0, ApplyMode::Normal, "tester", "测试负库存");
    assert!(matches!(result, Err(ApiError::BlockingNotOverridden(_))));
}

#[test]
fn test_manual_adjustment_requires_reason() {
    let (_temp_file, api, _conn) = setup();

    let result = api.apply_manual_adjustment("ING006", 100.0, ApplyMode::Normal, "tester", "  ");
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_physical_count_applies_atomically() {
    let (_temp_file, api, conn) = setup();

    let counts = vec![
        ("ING001".to_string(), 19_000.0),
        ("ING002".to_string(), 7_500.0),
    ];

    let preview = api.preview_physical_count(&counts).unwrap();
    assert!(!preview.report.blocking);

    let outcome = api
        .apply_physical_count(&counts, ApplyMode::Normal, "tester")
        .unwrap();
    assert_eq!(outcome.updated_ingredients, 2);
    assert_close(quantity_on_hand(&conn, "ING001"), 19_000.0);
    assert_close(quantity_on_hand(&conn, "ING002"), 7_500.0);

    let logs = api.recent_deductions(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].trigger_type, TriggerType::PhysicalCount);

    // 盘点清单含未知食材时整体失败
    let bad_counts = vec![("GHOST".to_string(), 1.0)];
    assert!(matches!(
        api.apply_physical_count(&bad_counts, ApplyMode::Normal, "tester"),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_low_stock_ratio_is_config_driven() {
    let (_temp_file, api, conn) = setup();

    // 默认 10%: 500 -> 100 不算低库存
    api.apply_manual_adjustment("ING006", 500.0, ApplyMode::Normal, "tester", "备料")
        .unwrap();
    let preview = api.preview_manual_adjustment("ING006", 100.0).unwrap();
    assert!(preview.report.is_clean());

    // 阈值改为 50% 后,100 < 250 触发 INFO
    let config = ConfigManager::from_connection(conn).unwrap();
    config
        .set_global_config_value(config_keys::LOW_STOCK_RATIO, "0.5")
        .unwrap();

    let preview = api.preview_manual_adjustment("ING006", 100.0).unwrap();
    assert_eq!(preview.report.count_by_severity(WarningSeverity::Info), 1);
}

#[test]
fn test_stock_health_summary() {
    let (_temp_file, api, _conn) = setup();

    // 制造一个归零、一个负库存
    api.apply_manual_adjustment("ING006", 0.0, ApplyMode::Normal, "tester", "用尽")
        .unwrap();
    api.apply_manual_adjustment("ING005", -5.0, ApplyMode::ForceOverride, "tester", "盘差")
        .unwrap();

    let summary = api.stock_health_summary().unwrap();
    assert_eq!(summary.total, 8);
    assert_eq!(summary.negative, 1);
    assert_eq!(summary.depleted, 1);
    assert_eq!(summary.healthy, 6);

    let recipe_api_logs = api.recent_deductions(10).unwrap();
    assert_eq!(recipe_api_logs.len(), 2);
    assert_eq!(recipe_api_logs.iter().filter(|l| l.blocking_overridden).count(), 1);
}

#[test]
fn test_sale_of_unknown_product_is_refused() {
    let (_temp_file, api, _conn) = setup();

    let result = api.preview_sale("PRD999", 1.0);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}
