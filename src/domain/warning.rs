// ==========================================
// 餐厅后厨库存决策系统 - 库存告警领域模型
// ==========================================
// 请求级临时结果: 扣减预览的告警报告
// 红线: blocking=true 的报告未经人工确认不得提交
// ==========================================

use crate::domain::types::WarningSeverity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StockProjection - 库存推演行
// ==========================================
// 单个受影响食材的 当前库存 -> 扣减后库存 推演
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockProjection {
    pub ingredient_id: String,   // 食材ID
    pub ingredient_name: String, // 食材名称 (告警展示用)
    pub unit: String,            // 计量单位
    pub current_quantity: f64,   // 当前库存
    pub required_quantity: f64,  // 本次需求量
    pub proposed_quantity: f64,  // 扣减后库存
}

// ==========================================
// StockWarning - 单条库存告警
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockWarning {
    pub ingredient_id: String,       // 食材ID
    pub ingredient_name: String,     // 食材名称
    pub severity: WarningSeverity,   // 告警等级
    pub message: String,             // 可解释原因
    pub details: Option<serde_json::Value>, // 额外信息
}

// ==========================================
// WarningReport - 告警报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningReport {
    pub report_id: String,          // 报告ID (uuid)
    pub warnings: Vec<StockWarning>, // 告警列表
    pub blocking: bool,              // 是否阻断提交
    pub created_at: NaiveDateTime,   // 生成时间
}

impl WarningReport {
    /// 按等级统计告警条数
    pub fn count_by_severity(&self, severity: WarningSeverity) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.severity == severity)
            .count()
    }

    /// 是否无任何告警
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
