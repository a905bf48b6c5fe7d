// ==========================================
// 配置管理器集成测试
// ==========================================
// 测试目标: 默认值回退、覆写、展开策略组装、快照
// ==========================================

mod test_helpers;

use restaurant_inventory_dss::config::{config_keys, ConfigManager};
use restaurant_inventory_dss::logging;
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, ConfigManager) {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    let config = ConfigManager::from_connection(conn).expect("Failed to build ConfigManager");
    (temp_file, config)
}

#[test]
fn test_defaults_when_unset() {
    let (_temp_file, config) = setup();

    assert_eq!(config.get_low_stock_ratio().unwrap(), 0.10);
    assert_eq!(config.get_max_product_depth().unwrap(), 2);
    assert_eq!(config.get_composite_depth_limit().unwrap(), None);

    let policy = config.get_resolve_policy().unwrap();
    assert_eq!(policy.max_product_depth, 2);
    assert_eq!(policy.composite_depth_limit, None);
}

#[test]
fn test_set_and_get_overrides() {
    let (_temp_file, config) = setup();

    config
        .set_global_config_value(config_keys::LOW_STOCK_RATIO, "0.25")
        .unwrap();
    config
        .set_global_config_value(config_keys::MAX_PRODUCT_DEPTH, "3")
        .unwrap();
    config
        .set_global_config_value(config_keys::COMPOSITE_DEPTH_LIMIT, "5")
        .unwrap();

    assert_eq!(config.get_low_stock_ratio().unwrap(), 0.25);
    assert_eq!(config.get_max_product_depth().unwrap(), 3);
    assert_eq!(config.get_composite_depth_limit().unwrap(), Some(5));

    // 覆写幂等 (UPSERT)
    config
        .set_global_config_value(config_keys::LOW_STOCK_RATIO, "0.30")
        .unwrap();
    assert_eq!(config.get_low_stock_ratio().unwrap(), 0.30);
}

#[test]
fn test_malformed_value_falls_back_to_default() {
    let (_temp_file, config) = setup();

    config
        .set_global_config_value(config_keys::LOW_STOCK_RATIO, "十分之一")
        .unwrap();
    assert_eq!(config.get_low_stock_ratio().unwrap(), 0.10);

    config
        .set_global_config_value(config_keys::COMPOSITE_DEPTH_LIMIT, "unlimited")
        .unwrap();
    assert_eq!(config.get_composite_depth_limit().unwrap(), None);
}

#[test]
fn test_config_snapshot_contains_overrides() {
    let (_temp_file, config) = setup();

    config
        .set_global_config_value(config_keys::LOW_STOCK_RATIO, "0.15")
        .unwrap();

    let snapshot = config.get_config_snapshot().unwrap();
    assert!(snapshot.contains(config_keys::LOW_STOCK_RATIO));
    assert!(snapshot.contains("0.15"));
}
