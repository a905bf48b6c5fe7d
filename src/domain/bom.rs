// ==========================================
// 餐厅后厨库存决策系统 - 物料清单 (BOM)
// ==========================================
// 请求级临时结果: 根实体展开后的基础食材需求量
// 不持久化; 提交库存扣减前先经过告警引擎评估
// ==========================================

use crate::domain::types::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// BillOfMaterials - 展开后的物料清单
// ==========================================
// requirements 仅包含基础 (非复合) 食材ID;
// 同一食材经多条路径到达时数量做可交换求和
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub root_type: SourceType,              // 根实体类型
    pub root_id: String,                    // 根实体ID
    pub quantity: f64,                      // 请求数量
    pub requirements: HashMap<String, f64>, // 基础食材ID -> 总需求量
}

impl BillOfMaterials {
    /// 创建空清单
    pub fn new(root_type: SourceType, root_id: &str, quantity: f64) -> Self {
        Self {
            root_type,
            root_id: root_id.to_string(),
            quantity,
            requirements: HashMap::new(),
        }
    }

    /// 累加一条基础食材需求 (跨路径求和)
    pub fn add_requirement(&mut self, ingredient_id: &str, quantity: f64) {
        *self
            .requirements
            .entry(ingredient_id.to_string())
            .or_insert(0.0) += quantity;
    }

    /// 查询某食材的总需求量 (不存在时为 0)
    pub fn requirement(&self, ingredient_id: &str) -> f64 {
        self.requirements.get(ingredient_id).copied().unwrap_or(0.0)
    }

    /// 将本清单的需求并入累计映射 (销售批量聚合用)
    pub fn fold_into(&self, acc: &mut HashMap<String, f64>) {
        for (ingredient_id, quantity) in &self.requirements {
            *acc.entry(ingredient_id.clone()).or_insert(0.0) += quantity;
        }
    }

    /// 是否为空清单
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_requirement_sums_across_paths() {
        let mut bom = BillOfMaterials::new(SourceType::Product, "PRD001", 2.0);
        bom.add_requirement("ING001", 1.5);
        bom.add_requirement("ING001", 2.5);
        bom.add_requirement("ING002", 3.0);

        assert_eq!(bom.requirement("ING001"), 4.0);
        assert_eq!(bom.requirement("ING002"), 3.0);
        assert_eq!(bom.requirement("ING999"), 0.0);
    }

    #[test]
    fn test_fold_into_accumulates() {
        let mut a = BillOfMaterials::new(SourceType::Product, "PRD001", 1.0);
        a.add_requirement("ING001", 1.0);
        let mut b = BillOfMaterials::new(SourceType::Product, "PRD002", 1.0);
        b.add_requirement("ING001", 2.0);
        b.add_requirement("ING002", 5.0);

        let mut acc = HashMap::new();
        a.fold_into(&mut acc);
        b.fold_into(&mut acc);

        assert_eq!(acc.get("ING001"), Some(&3.0));
        assert_eq!(acc.get("ING002"), Some(&5.0));
    }
}
