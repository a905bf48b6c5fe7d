// ==========================================
// 餐厅后厨库存决策系统 - 领域类型定义
// ==========================================
// 红线: 等级制告警,不是评分制
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 配方来源类型 (Source Type)
// ==========================================
// 产品配方行的引用目标: 食材或另一个产品
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Ingredient, // 食材 (基础或复合)
    Product,    // 产品 (套餐/组合)
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Ingredient => write!(f, "INGREDIENT"),
            SourceType::Product => write!(f, "PRODUCT"),
        }
    }
}

impl SourceType {
    /// 从字符串解析来源类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INGREDIENT" => Some(SourceType::Ingredient),
            "PRODUCT" => Some(SourceType::Product),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SourceType::Ingredient => "INGREDIENT",
            SourceType::Product => "PRODUCT",
        }
    }
}

// ==========================================
// 告警等级 (Warning Severity)
// ==========================================
// 顺序: Info < Warning < Critical
// 红线: 只有 Critical 阻断提交,其余仅提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSeverity {
    Info,     // 库存偏低提示
    Warning,  // 库存归零
    Critical, // 库存为负,阻断
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningSeverity::Info => write!(f, "INFO"),
            WarningSeverity::Warning => write!(f, "WARNING"),
            WarningSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl WarningSeverity {
    /// 从字符串解析告警等级
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INFO" => Some(WarningSeverity::Info),
            "WARNING" => Some(WarningSeverity::Warning),
            "CRITICAL" => Some(WarningSeverity::Critical),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WarningSeverity::Info => "INFO",
            WarningSeverity::Warning => "WARNING",
            WarningSeverity::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 配方校验违规类型 (Violation Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    SelfReference,       // 配方引用了正在编辑的实体自身
    CircularDependency,  // 引用链构成环
    DepthExceeded,       // 产品嵌套深度超限
    UnknownSource,       // 引用的食材/产品不存在
    NonPositiveQuantity, // 配方行数量非正
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationType::SelfReference => write!(f, "SELF_REFERENCE"),
            ViolationType::CircularDependency => write!(f, "CIRCULAR_DEPENDENCY"),
            ViolationType::DepthExceeded => write!(f, "DEPTH_EXCEEDED"),
            ViolationType::UnknownSource => write!(f, "UNKNOWN_SOURCE"),
            ViolationType::NonPositiveQuantity => write!(f, "NON_POSITIVE_QUANTITY"),
        }
    }
}

// ==========================================
// 扣减触发类型 (Trigger Type)
// ==========================================
// 用于 deduction_log 审计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Sale,          // 单笔销售
    SalesImport,   // 销售文件批量导入
    ManualEdit,    // 人工库存调整
    PhysicalCount, // 盘点校正
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Sale => write!(f, "SALE"),
            TriggerType::SalesImport => write!(f, "SALES_IMPORT"),
            TriggerType::ManualEdit => write!(f, "MANUAL_EDIT"),
            TriggerType::PhysicalCount => write!(f, "PHYSICAL_COUNT"),
        }
    }
}

impl TriggerType {
    /// 从字符串解析触发类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SALE" => Some(TriggerType::Sale),
            "SALES_IMPORT" => Some(TriggerType::SalesImport),
            "MANUAL_EDIT" => Some(TriggerType::ManualEdit),
            "PHYSICAL_COUNT" => Some(TriggerType::PhysicalCount),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TriggerType::Sale => "SALE",
            TriggerType::SalesImport => "SALES_IMPORT",
            TriggerType::ManualEdit => "MANUAL_EDIT",
            TriggerType::PhysicalCount => "PHYSICAL_COUNT",
        }
    }
}
