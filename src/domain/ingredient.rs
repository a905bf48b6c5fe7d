// ==========================================
// 餐厅后厨库存决策系统 - 食材领域模型
// ==========================================
// 红线: 被任何配方行引用的食材不可删除
// 复合食材: batch_size 为一次制作批次的产出量,必须 > 0 才可展开
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Ingredient - 食材主数据
// ==========================================
// 基础食材直接从采购库存扣减;
// 复合食材 (自制酱料等) 通过批次配方展开为基础食材
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    // ===== 主键 =====
    pub ingredient_id: String, // 食材ID

    // ===== 基本信息 =====
    pub name: String, // 食材名称
    pub code: String, // 食材编码 (唯一,用于导入匹配)
    pub unit: String, // 计量单位 (g/ml/个...)

    // ===== 成本与库存 =====
    pub unit_cost: f64,         // 单位成本
    pub quantity_on_hand: f64,  // 当前库存量

    // ===== 复合食材 =====
    pub is_composite: bool,     // 是否复合食材
    pub batch_size: Option<f64>, // 批次产出量 (复合食材必填)

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ingredient {
    /// 是否基础食材 (直接扣减库存)
    pub fn is_base(&self) -> bool {
        !self.is_composite
    }

    /// 有效批次产出量
    ///
    /// # 返回
    /// - Some(batch_size): 复合食材且 batch_size > 0
    /// - None: 非复合食材,或 batch_size 缺失/非正
    pub fn effective_batch_size(&self) -> Option<f64> {
        if !self.is_composite {
            return None;
        }
        match self.batch_size {
            Some(b) if b > 0.0 => Some(b),
            _ => None,
        }
    }
}

// ==========================================
// CompositeRecipeLine - 复合食材批次配方行
// ==========================================
// 一个复合食材的一个批次消耗的某种食材数量
// 不变量: base_ingredient_id != composite_id (本边禁止自环)
// 说明: 配方行允许引用另一个复合食材 (嵌套展开在解析引擎中完成)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeRecipeLine {
    pub composite_id: String,       // 复合食材ID
    pub line_no: i32,               // 行号 (从 1 开始)
    pub base_ingredient_id: String, // 被消耗食材ID
    pub quantity_per_batch: f64,    // 每批次用量
    pub unit: String,               // 计量单位
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ingredient(is_composite: bool, batch_size: Option<f64>) -> Ingredient {
        Ingredient {
            ingredient_id: "ING001".to_string(),
            name: "番茄酱".to_string(),
            code: "TOMATO-SAUCE".to_string(),
            unit: "ml".to_string(),
            unit_cost: 0.02,
            quantity_on_hand: 500.0,
            is_composite,
            batch_size,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_effective_batch_size() {
        // 基础食材无批次
        assert_eq!(ingredient(false, None).effective_batch_size(), None);
        // 复合食材批次有效
        assert_eq!(ingredient(true, Some(128.0)).effective_batch_size(), Some(128.0));
        // 复合食材批次缺失或非正
        assert_eq!(ingredient(true, None).effective_batch_size(), None);
        assert_eq!(ingredient(true, Some(0.0)).effective_batch_size(), None);
        assert_eq!(ingredient(true, Some(-1.0)).effective_batch_size(), None);
    }
}
