// ==========================================
// 餐厅后厨库存决策系统 - 成本计算引擎
// ==========================================
// 职责: 自底向上计算产品/食材的当前成本
// 输入: 配方目录 + 根实体
// 输出: 单位成本 (货币)
// ==========================================
// 红线: 复合食材与嵌套产品的成本永远由成分行实时汇总,
//       不读取任何预存成本字段 (保证价格变动即时生效)
// 红线: 成本计算可独立于校验被调用,必须自带在途路径环检查
// ==========================================

use crate::domain::catalog::RecipeCatalog;
use crate::domain::types::SourceType;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashSet;

// ==========================================
// CostCalculator - 成本计算引擎
// ==========================================
// 无状态引擎,纯函数
pub struct CostCalculator {
    // 无状态
}

impl CostCalculator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算根实体一个单位的成本
    ///
    /// # 参数
    /// - `catalog`: 配方目录快照
    /// - `root_type`: 根实体类型
    /// - `root_id`: 根实体ID
    ///
    /// # 返回
    /// - Ok(f64): 单位成本
    /// - Err(CycleDetected): 配方图存在环
    /// - Err(InvalidBatchSize): 复合食材批次产出量非法
    /// - Err(EntityNotFound): 悬挂引用
    pub fn total_cost(
        &self,
        catalog: &RecipeCatalog,
        root_type: SourceType,
        root_id: &str,
    ) -> EngineResult<f64> {
        let mut path: Vec<String> = Vec::new();
        let mut on_path: HashSet<String> = HashSet::new();

        match root_type {
            SourceType::Ingredient => {
                self.ingredient_unit_cost(catalog, root_id, &mut path, &mut on_path)
            }
            SourceType::Product => {
                self.product_unit_cost(catalog, root_id, &mut path, &mut on_path)
            }
        }
    }

    // ==========================================
    // 食材单位成本
    // ==========================================

    /// 基础食材直接取 unit_cost;
    /// 复合食材 = (Σ 配方行用量 × 行食材单位成本) / 批次产出量
    fn ingredient_unit_cost(
        &self,
        catalog: &RecipeCatalog,
        ingredient_id: &str,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
    ) -> EngineResult<f64> {
        let ingredient =
            catalog
                .ingredient(ingredient_id)
                .ok_or_else(|| EngineError::EntityNotFound {
                    entity: "食材".to_string(),
                    id: ingredient_id.to_string(),
                })?;

        if ingredient.is_base() {
            return Ok(ingredient.unit_cost);
        }

        let batch_size =
            ingredient
                .effective_batch_size()
                .ok_or_else(|| EngineError::InvalidBatchSize {
                    ingredient_id: ingredient_id.to_string(),
                    batch_size: ingredient.batch_size.unwrap_or(0.0),
                })?;

        let node_key = format!("ING:{}", ingredient_id);
        if !on_path.insert(node_key.clone()) {
            return Err(EngineError::CycleDetected {
                node_id: ingredient_id.to_string(),
                path: path.join(" -> "),
            });
        }
        path.push(node_key.clone());

        let mut batch_cost = 0.0;
        for line in catalog.composite_lines(ingredient_id) {
            let line_unit_cost =
                self.ingredient_unit_cost(catalog, &line.base_ingredient_id, path, on_path)?;
            batch_cost += line.quantity_per_batch * line_unit_cost;
        }

        path.pop();
        on_path.remove(&node_key);

        Ok(batch_cost / batch_size)
    }

    // ==========================================
    // 产品单位成本
    // ==========================================

    /// 产品成本 = Σ 配方行 (用量 × 行来源单位成本)
    fn product_unit_cost(
        &self,
        catalog: &RecipeCatalog,
        product_id: &str,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
    ) -> EngineResult<f64> {
        if catalog.product(product_id).is_none() {
            return Err(EngineError::EntityNotFound {
                entity: "产品".to_string(),
                id: product_id.to_string(),
            });
        }

        let node_key = format!("PRD:{}", product_id);
        if !on_path.insert(node_key.clone()) {
            return Err(EngineError::CycleDetected {
                node_id: product_id.to_string(),
                path: path.join(" -> "),
            });
        }
        path.push(node_key.clone());

        let mut cost = 0.0;
        for line in catalog.product_lines(product_id) {
            let line_unit_cost = match line.source_type {
                SourceType::Ingredient => {
                    self.ingredient_unit_cost(catalog, &line.source_id, path, on_path)?
                }
                SourceType::Product => {
                    self.product_unit_cost(catalog, &line.source_id, path, on_path)?
                }
            };
            cost += line.quantity * line_unit_cost;
        }

        path.pop();
        on_path.remove(&node_key);

        Ok(cost)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for CostCalculator {
    fn default() -> Self {
        Self::new()
    }
}
