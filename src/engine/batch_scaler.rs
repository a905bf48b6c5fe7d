// ==========================================
// 餐厅后厨库存决策系统 - 批次换算引擎
// ==========================================
// 职责: 将复合食材的需求量按批次产出量等比换算为配方行用量
// 输入: 配方目录 + 复合食材ID + 需求量
// 输出: 被消耗食材ID -> 换算后用量
// ==========================================
// 数值语义: 浮点乘法,本层不做任何舍入 (舍入只发生在展示侧)
// ==========================================

use crate::domain::catalog::RecipeCatalog;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashMap;

// ==========================================
// BatchScaler - 批次换算引擎
// ==========================================
// 无状态引擎,纯函数,无副作用
pub struct BatchScaler {
    // 无状态
}

impl BatchScaler {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算换算系数 factor = 需求量 / 批次产出量
    ///
    /// # 参数
    /// - `catalog`: 配方目录快照
    /// - `composite_id`: 复合食材ID
    /// - `quantity_needed`: 需求量
    ///
    /// # 返回
    /// - Ok(f64): 换算系数
    /// - Err(InvalidBatchSize): 批次产出量缺失或非正
    /// - Err(EntityNotFound): 食材不存在
    pub fn scale_factor(
        &self,
        catalog: &RecipeCatalog,
        composite_id: &str,
        quantity_needed: f64,
    ) -> EngineResult<f64> {
        let ingredient =
            catalog
                .ingredient(composite_id)
                .ok_or_else(|| EngineError::EntityNotFound {
                    entity: "食材".to_string(),
                    id: composite_id.to_string(),
                })?;

        let batch_size =
            ingredient
                .effective_batch_size()
                .ok_or_else(|| EngineError::InvalidBatchSize {
                    ingredient_id: composite_id.to_string(),
                    batch_size: ingredient.batch_size.unwrap_or(0.0),
                })?;

        Ok(quantity_needed / batch_size)
    }

    /// 展开一层批次配方: 需求量 -> 每条配方行的换算后用量
    ///
    /// # 参数
    /// - `catalog`: 配方目录快照
    /// - `composite_id`: 复合食材ID
    /// - `quantity_needed`: 需求量
    ///
    /// # 返回
    /// 被消耗食材ID -> 用量 (同一食材出现在多行时求和);
    /// 被消耗食材本身可以是复合食材,递归展开由解析引擎负责
    pub fn scale(
        &self,
        catalog: &RecipeCatalog,
        composite_id: &str,
        quantity_needed: f64,
    ) -> EngineResult<HashMap<String, f64>> {
        let factor = self.scale_factor(catalog, composite_id, quantity_needed)?;

        let mut scaled: HashMap<String, f64> = HashMap::new();
        for line in catalog.composite_lines(composite_id) {
            *scaled
                .entry(line.base_ingredient_id.clone())
                .or_insert(0.0) += line.quantity_per_batch * factor;
        }

        Ok(scaled)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for BatchScaler {
    fn default() -> Self {
        Self::new()
    }
}
