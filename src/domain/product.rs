// ==========================================
// 餐厅后厨库存决策系统 - 产品领域模型
// ==========================================
// 产品配方行可引用食材或另一个产品 (套餐嵌套)
// 不变量: 产品引用图必须无环,且嵌套深度有界 (默认 2 层)
// ==========================================

use crate::domain::types::SourceType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 产品主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    // ===== 主键 =====
    pub product_id: String, // 产品ID

    // ===== 基本信息 =====
    pub name: String,          // 产品名称
    pub category: String,      // 分类
    pub selling_price: f64,    // 售价

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// ProductRecipeLine - 产品配方行
// ==========================================
// source_type = INGREDIENT: 消耗 quantity 个单位的该食材
// source_type = PRODUCT:    嵌套 quantity 份该产品的完整配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecipeLine {
    pub product_id: String,      // 所属产品ID
    pub line_no: i32,            // 行号 (从 1 开始)
    pub source_type: SourceType, // 引用类型
    pub source_id: String,       // 被引用食材/产品ID
    pub quantity: f64,           // 每份产品用量
    pub unit: String,            // 计量单位
}
