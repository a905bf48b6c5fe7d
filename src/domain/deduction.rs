// ==========================================
// 餐厅后厨库存决策系统 - 扣减审计领域模型
// ==========================================
// deduction_log: 每次实际落库的库存变更记录一条
// 红线: 预览不落库,落库必留痕
// ==========================================

use crate::domain::types::{SourceType, TriggerType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// DeductionLogEntry - 扣减审计记录
// ==========================================
// detail 为 JSON: 每食材增减量 + 告警报告快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionLogEntry {
    pub log_id: String,                // 记录ID (uuid)
    pub trigger_type: TriggerType,     // 触发类型
    pub root_type: Option<SourceType>, // 根实体类型 (盘点/人工调整时为空)
    pub root_id: Option<String>,       // 根实体ID
    pub quantity: Option<f64>,         // 请求数量
    pub blocking_overridden: bool,     // 是否人工突破了阻断告警
    pub detail: String,                // JSON 详情
    pub operator: Option<String>,      // 操作人
    pub created_at: NaiveDateTime,     // 落库时间
}
