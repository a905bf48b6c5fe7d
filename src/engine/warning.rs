// ==========================================
// 餐厅后厨库存决策系统 - 库存告警引擎
// ==========================================
// 职责: 对扣减推演结果分级告警并判定是否阻断
// 输入: 库存推演行 (当前库存 -> 扣减后库存) + 低库存阈值比例
// 输出: WarningReport (告警报告)
// ==========================================
// 规则 (可解释):
// - CRITICAL: 扣减后为负,阻断提交
// - WARNING:  扣减后恰好归零,不阻断
// - INFO:     扣减后低于 当前库存 × 阈值比例,不阻断
// 红线: 本引擎只读,落库由调用方在人工确认后单独执行
// ==========================================

use crate::domain::types::WarningSeverity;
use crate::domain::warning::{StockProjection, StockWarning, WarningReport};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

/// 低库存阈值比例默认值 (10%)
pub const DEFAULT_LOW_STOCK_RATIO: f64 = 0.10;

// ==========================================
// StockWarningEngine - 库存告警引擎
// ==========================================
// 无状态引擎,纯函数
pub struct StockWarningEngine {
    // 无状态
}

impl StockWarningEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 单个食材的告警分级
    ///
    /// # 参数
    /// - `current_quantity`: 当前库存
    /// - `proposed_quantity`: 扣减后库存
    /// - `low_stock_ratio`: 低库存阈值比例
    ///
    /// # 返回
    /// - Some((severity, message)): 命中分级规则
    /// - None: 无需告警
    pub fn classify(
        &self,
        current_quantity: f64,
        proposed_quantity: f64,
        low_stock_ratio: f64,
    ) -> Option<(WarningSeverity, String)> {
        if proposed_quantity < 0.0 {
            return Some((
                WarningSeverity::Critical,
                format!(
                    "库存将为负: 当前 {}, 扣减后 {}",
                    current_quantity, proposed_quantity
                ),
            ));
        }

        if proposed_quantity == 0.0 {
            return Some((
                WarningSeverity::Warning,
                format!("库存将归零: 当前 {}", current_quantity),
            ));
        }

        let threshold = current_quantity * low_stock_ratio;
        if proposed_quantity < threshold {
            return Some((
                WarningSeverity::Info,
                format!(
                    "库存偏低: 扣减后 {} 低于当前库存的 {:.0}% ({})",
                    proposed_quantity,
                    low_stock_ratio * 100.0,
                    threshold
                ),
            ));
        }

        None
    }

    /// 对一组库存推演行生成告警报告
    ///
    /// # 参数
    /// - `projections`: 受影响食材的库存推演
    /// - `low_stock_ratio`: 低库存阈值比例
    ///
    /// # 返回
    /// WarningReport; blocking = 存在 CRITICAL 告警
    pub fn evaluate(
        &self,
        projections: &[StockProjection],
        low_stock_ratio: f64,
    ) -> WarningReport {
        let mut warnings = Vec::new();
        let mut blocking = false;

        for projection in projections {
            if let Some((severity, message)) = self.classify(
                projection.current_quantity,
                projection.proposed_quantity,
                low_stock_ratio,
            ) {
                if severity == WarningSeverity::Critical {
                    blocking = true;
                }
                warnings.push(StockWarning {
                    ingredient_id: projection.ingredient_id.clone(),
                    ingredient_name: projection.ingredient_name.clone(),
                    severity,
                    message,
                    details: Some(json!({
                        "current_quantity": projection.current_quantity,
                        "required_quantity": projection.required_quantity,
                        "proposed_quantity": projection.proposed_quantity,
                        "low_stock_ratio": low_stock_ratio,
                    })),
                });
            }
        }

        WarningReport {
            report_id: Uuid::new_v4().to_string(),
            warnings,
            blocking,
            created_at: Utc::now().naive_utc(),
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for StockWarningEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn projection(id: &str, current: f64, required: f64) -> StockProjection {
        StockProjection {
            ingredient_id: id.to_string(),
            ingredient_name: id.to_string(),
            unit: "g".to_string(),
            current_quantity: current,
            required_quantity: required,
            proposed_quantity: current - required,
        }
    }

    #[test]
    fn test_classify_negative_is_critical() {
        let engine = StockWarningEngine::new();
        let result = engine.classify(100.0, -10.0, DEFAULT_LOW_STOCK_RATIO);

        let (severity, message) = result.unwrap();
        assert_eq!(severity, WarningSeverity::Critical);
        assert!(message.contains("库存将为负"));
    }

    #[test]
    fn test_classify_zero_is_warning() {
        let engine = StockWarningEngine::new();
        let (severity, _) = engine.classify(50.0, 0.0, DEFAULT_LOW_STOCK_RATIO).unwrap();
        assert_eq!(severity, WarningSeverity::Warning);
    }

    #[test]
    fn test_classify_low_stock_is_info() {
        // 当前 50,阈值 10% -> 5; 扣减后 4 < 5 -> INFO
        let engine = StockWarningEngine::new();
        let (severity, _) = engine.classify(50.0, 4.0, DEFAULT_LOW_STOCK_RATIO).unwrap();
        assert_eq!(severity, WarningSeverity::Info);
    }

    #[test]
    fn test_classify_at_threshold_no_entry() {
        // 扣减后恰等于阈值: 不告警 (严格小于才命中)
        let engine = StockWarningEngine::new();
        assert!(engine.classify(50.0, 5.0, DEFAULT_LOW_STOCK_RATIO).is_none());
    }

    #[test]
    fn test_classify_healthy_no_entry() {
        let engine = StockWarningEngine::new();
        assert!(engine.classify(100.0, 80.0, DEFAULT_LOW_STOCK_RATIO).is_none());
    }

    #[test]
    fn test_evaluate_blocking_on_critical() {
        let engine = StockWarningEngine::new();
        let projections = vec![
            projection("ING001", 100.0, 110.0), // -10 -> CRITICAL
            projection("ING002", 100.0, 20.0),  // 80 -> 无告警
        ];

        let report = engine.evaluate(&projections, DEFAULT_LOW_STOCK_RATIO);

        assert!(report.blocking);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.count_by_severity(WarningSeverity::Critical), 1);
        assert_eq!(report.warnings[0].ingredient_id, "ING001");
    }

    #[test]
    fn test_evaluate_info_not_blocking() {
        let engine = StockWarningEngine::new();
        let projections = vec![projection("ING001", 50.0, 46.0)]; // 4 < 5 -> INFO

        let report = engine.evaluate(&projections, DEFAULT_LOW_STOCK_RATIO);

        assert!(!report.blocking);
        assert_eq!(report.count_by_severity(WarningSeverity::Info), 1);
    }

    #[test]
    fn test_evaluate_clean_report() {
        let engine = StockWarningEngine::new();
        let projections = vec![projection("ING001", 100.0, 10.0)];

        let report = engine.evaluate(&projections, DEFAULT_LOW_STOCK_RATIO);

        assert!(report.is_clean());
        assert!(!report.blocking);
    }

    #[test]
    fn test_evaluate_mixed_severities() {
        let engine = StockWarningEngine::new();
        let projections = vec![
            projection("A", 100.0, 110.0), // CRITICAL
            projection("B", 50.0, 50.0),   // WARNING (归零)
            projection("C", 50.0, 46.0),   // INFO
            projection("D", 100.0, 5.0),   // 无告警
        ];

        let report = engine.evaluate(&projections, DEFAULT_LOW_STOCK_RATIO);

        assert!(report.blocking);
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(report.count_by_severity(WarningSeverity::Critical), 1);
        assert_eq!(report.count_by_severity(WarningSeverity::Warning), 1);
        assert_eq!(report.count_by_severity(WarningSeverity::Info), 1);
    }
}
