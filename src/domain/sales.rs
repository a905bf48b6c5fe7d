// ==========================================
// 餐厅后厨库存决策系统 - 销售记录领域模型
// ==========================================
// 销售文件导入后的内部表示,驱动批量库存扣减
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RawSalesRecord - 字段映射后的中间记录
// ==========================================
// 仅完成列名到字段的映射与类型转换,
// 产品匹配与数量校验在导入器中进行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSalesRecord {
    pub product_ref: String,            // 产品ID或产品名称 (待匹配)
    pub quantity: f64,                  // 售出份数
    pub sold_at: Option<NaiveDateTime>, // 售出时间 (文件可缺省)
    pub row_number: usize,              // 来源文件行号 (从 1 开始,不含表头)
}

// ==========================================
// SalesRecord - 单条销售记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: String,             // 产品ID (已通过编码匹配)
    pub quantity: f64,                  // 售出份数
    pub sold_at: Option<NaiveDateTime>, // 售出时间 (文件可缺省)
    pub source_row: Option<usize>,      // 来源文件行号 (导入追溯用)
}
