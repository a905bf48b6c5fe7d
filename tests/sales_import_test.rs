// ==========================================
// 销售导入端到端测试
// ==========================================
// 测试目标: 文件解析、行错误累积、整批聚合、一次落库一条审计
// ==========================================

mod test_helpers;

use restaurant_inventory_dss::api::{ApplyMode, SalesApi};
use restaurant_inventory_dss::domain::types::TriggerType;
use restaurant_inventory_dss::logging;
use restaurant_inventory_dss::repository::DeductionLogRepository;
use std::io::Write;
use std::sync::{Arc, Mutex};
use test_helpers::*;

const FIXTURE_CSV: &str = "tests/fixtures/test_sales.csv";

fn setup() -> (
    tempfile::NamedTempFile,
    SalesApi,
    Arc<Mutex<rusqlite::Connection>>,
) {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path);
    seed_pizza_scenario(conn.clone()).expect("Failed to seed");
    let api = SalesApi::from_connection(conn.clone()).expect("Failed to build SalesApi");
    (temp_file, api, conn)
}

#[tokio::test]
async fn test_preview_sales_file_aggregates_batch() {
    let (_temp_file, api, conn) = setup();

    let before = quantity_on_hand(&conn, "ING001");
    let preview = api.preview_sales_file(FIXTURE_CSV).await.unwrap();

    // 6 行: 3 行有效 (含按名称匹配的套餐),3 行错误
    assert_eq!(preview.summary.total_rows, 6);
    assert_eq!(preview.summary.parsed, 3);
    assert_eq!(preview.summary.failed, 3);
    assert_eq!(preview.row_errors.len(), 3);

    // 聚合需求: 披萨 2 + 套餐 1(含披萨 1, 米饭 2) + 米饭 1
    // 面团 = 3 份披萨 * 250
    assert_close(*preview.requirements.get("ING001").unwrap(), 750.0);
    // 番茄膏 = 3 份披萨 * 3.0 (经酱批次展开)
    assert_close(*preview.requirements.get("ING003").unwrap(), 9.0);
    // 米饭 = 3 份 * 200
    assert_close(*preview.requirements.get("ING007").unwrap(), 600.0);

    // 预览不落库
    assert_eq!(quantity_on_hand(&conn, "ING001"), before);
    assert!(preview.preview.is_some());
    assert!(!preview.preview.unwrap().report.blocking);
}

#[tokio::test]
async fn test_import_sales_file_applies_once_with_single_audit_entry() {
    let (_temp_file, api, conn) = setup();

    let before = quantity_on_hand(&conn, "ING001");
    let response = api
        .import_sales_file(FIXTURE_CSV, ApplyMode::Normal, "tester")
        .await
        .unwrap();

    assert_eq!(response.summary.parsed, 3);
    assert_eq!(response.row_errors.len(), 3);
    let outcome = response.outcome.expect("expected outcome");
    assert_eq!(outcome.updated_ingredients, 7); // 全部基础食材
    assert!(!outcome.blocking_overridden);

    // 整批一次扣减
    assert_close(quantity_on_hand(&conn, "ING001"), before - 750.0);
    assert_close(quantity_on_hand(&conn, "ING007"), 15_000.0 - 600.0);

    // 整批一条审计记录
    let logs = DeductionLogRepository::from_connection(conn)
        .list_recent(10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].trigger_type, TriggerType::SalesImport);
    assert!(logs[0].root_id.is_none());
    assert!(logs[0].detail.contains("row_errors"));
}

#[tokio::test]
async fn test_import_with_no_valid_rows_does_not_apply() {
    let (_temp_file, api, conn) = setup();

    // 全部行都无法匹配产品
    let mut bad_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(bad_file, "产品ID,数量").unwrap();
    writeln!(bad_file, "PRD888,1").unwrap();
    writeln!(bad_file, "PRD999,2").unwrap();

    let before = quantity_on_hand(&conn, "ING001");
    let response = api
        .import_sales_file(bad_file.path(), ApplyMode::Normal, "tester")
        .await
        .unwrap();

    assert_eq!(response.summary.parsed, 0);
    assert_eq!(response.row_errors.len(), 2);
    assert!(response.outcome.is_none());

    // 未落库、无审计
    assert_eq!(quantity_on_hand(&conn, "ING001"), before);
    let logs = DeductionLogRepository::from_connection(conn)
        .list_recent(10)
        .unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_import_missing_file_is_file_level_error() {
    let (_temp_file, api, _conn) = setup();

    let result = api
        .import_sales_file("tests/fixtures/no_such_file.csv", ApplyMode::Normal, "tester")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_blocked_import_refused_without_override() {
    let (_temp_file, api, conn) = setup();

    // 大单: 100 份套餐 -> 面团 100*250=25000 > 20000,扣减后为负
    let mut big_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(big_file, "产品ID,数量").unwrap();
    writeln!(big_file, "PRD100,100").unwrap();

    let before = quantity_on_hand(&conn, "ING001");
    let result = api
        .import_sales_file(big_file.path(), ApplyMode::Normal, "tester")
        .await;
    assert!(result.is_err());
    assert_eq!(quantity_on_hand(&conn, "ING001"), before);

    // 人工突破后落库
    let response = api
        .import_sales_file(big_file.path(), ApplyMode::ForceOverride, "tester")
        .await
        .unwrap();
    let outcome = response.outcome.expect("expected outcome");
    assert!(outcome.blocking_overridden);
    assert_close(quantity_on_hand(&conn, "ING001"), before - 25_000.0);
}
