// ==========================================
// 餐厅后厨库存决策系统 - 配方解析引擎
// ==========================================
// 职责: 将产品/复合食材递归展开为基础食材需求清单 (BOM)
// 输入: 配方目录 + 根实体 + 需求量
// 输出: BillOfMaterials (基础食材ID -> 总需求量)
// ==========================================
// 红线: 深度优先遍历必须携带在途路径集合,
//       环与深度检查不依赖调用栈深度
// 保证: 结果只含非复合食材; 多路径到达同一食材时数量求和,
//       遍历顺序不影响最终聚合结果
// ==========================================

use crate::domain::bom::BillOfMaterials;
use crate::domain::catalog::RecipeCatalog;
use crate::domain::types::SourceType;
use crate::engine::batch_scaler::BatchScaler;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// 产品嵌套深度默认上限 (根产品为第 0 层)
pub const DEFAULT_MAX_PRODUCT_DEPTH: usize = 2;

// ==========================================
// ResolvePolicy - 展开策略
// ==========================================
// 产品嵌套有上限而复合食材嵌套默认不设限,
// 该不对称为显式策略而非隐含假设:
// 复合食材递归由环检查兜底,必要时可配置 composite_depth_limit
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolvePolicy {
    pub max_product_depth: usize,            // 产品嵌套深度上限
    pub composite_depth_limit: Option<usize>, // 复合食材嵌套上限 (None=不限)
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self {
            max_product_depth: DEFAULT_MAX_PRODUCT_DEPTH,
            composite_depth_limit: None,
        }
    }
}

// ==========================================
// RecipeResolver - 配方解析引擎
// ==========================================
// 无状态引擎,目录快照由调用方传入
pub struct RecipeResolver {
    policy: ResolvePolicy,
    scaler: BatchScaler,
}

impl RecipeResolver {
    /// 使用默认策略构造
    pub fn new() -> Self {
        Self::with_policy(ResolvePolicy::default())
    }

    /// 使用指定策略构造
    pub fn with_policy(policy: ResolvePolicy) -> Self {
        Self {
            policy,
            scaler: BatchScaler::new(),
        }
    }

    /// 当前展开策略
    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 展开根实体为基础食材需求清单
    ///
    /// # 参数
    /// - `catalog`: 配方目录快照
    /// - `root_type`: 根实体类型 (食材/产品)
    /// - `root_id`: 根实体ID
    /// - `quantity`: 需求量
    ///
    /// # 返回
    /// - Ok(BillOfMaterials): 展开成功
    /// - Err(CycleDetected): 展开路径上出现重复节点
    /// - Err(DepthExceeded): 产品嵌套超过策略上限
    /// - Err(InvalidBatchSize): 复合食材批次产出量非法
    /// - Err(EntityNotFound): 悬挂引用
    pub fn resolve(
        &self,
        catalog: &RecipeCatalog,
        root_type: SourceType,
        root_id: &str,
        quantity: f64,
    ) -> EngineResult<BillOfMaterials> {
        let mut bom = BillOfMaterials::new(root_type, root_id, quantity);
        let mut path: Vec<String> = Vec::new();
        let mut on_path: HashSet<String> = HashSet::new();

        match root_type {
            SourceType::Ingredient => {
                self.resolve_ingredient(catalog, root_id, quantity, 0, &mut path, &mut on_path, &mut bom)?
            }
            SourceType::Product => {
                self.resolve_product(catalog, root_id, quantity, 0, &mut path, &mut on_path, &mut bom)?
            }
        }

        debug!(
            root_type = %root_type,
            root_id = %root_id,
            quantity = quantity,
            base_ingredients = bom.requirements.len(),
            "配方展开完成"
        );

        Ok(bom)
    }

    // ==========================================
    // 食材展开
    // ==========================================

    /// 展开单个食材节点
    ///
    /// 基础食材直接累加; 复合食材经批次换算后逐行递归
    #[allow(clippy::too_many_arguments)]
    fn resolve_ingredient(
        &self,
        catalog: &RecipeCatalog,
        ingredient_id: &str,
        quantity: f64,
        composite_depth: usize,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
        bom: &mut BillOfMaterials,
    ) -> EngineResult<()> {
        let ingredient =
            catalog
                .ingredient(ingredient_id)
                .ok_or_else(|| EngineError::EntityNotFound {
                    entity: "食材".to_string(),
                    id: ingredient_id.to_string(),
                })?;

        // 基础食材: 叶子节点,跨路径求和
        if ingredient.is_base() {
            bom.add_requirement(ingredient_id, quantity);
            return Ok(());
        }

        // 复合食材: 可选的嵌套上限 (默认不限)
        let next_depth = composite_depth + 1;
        if let Some(limit) = self.policy.composite_depth_limit {
            if next_depth > limit {
                return Err(EngineError::DepthExceeded {
                    depth: next_depth,
                    max_depth: limit,
                });
            }
        }

        // 环检查: 节点键带类型前缀,食材与产品ID空间互不干扰
        let node_key = format!("ING:{}", ingredient_id);
        if !on_path.insert(node_key.clone()) {
            return Err(EngineError::CycleDetected {
                node_id: ingredient_id.to_string(),
                path: path.join(" -> "),
            });
        }
        path.push(node_key.clone());

        let scaled = self.scaler.scale(catalog, ingredient_id, quantity)?;
        for (line_ingredient_id, line_quantity) in scaled {
            self.resolve_ingredient(
                catalog,
                &line_ingredient_id,
                line_quantity,
                next_depth,
                path,
                on_path,
                bom,
            )?;
        }

        path.pop();
        on_path.remove(&node_key);
        Ok(())
    }

    // ==========================================
    // 产品展开
    // ==========================================

    /// 展开单个产品节点
    ///
    /// 食材行按 quantity * line.quantity 递归;
    /// 产品行嵌套深度 +1,超过 max_product_depth 则拒绝
    #[allow(clippy::too_many_arguments)]
    fn resolve_product(
        &self,
        catalog: &RecipeCatalog,
        product_id: &str,
        quantity: f64,
        product_depth: usize,
        path: &mut Vec<String>,
        on_path: &mut HashSet<String>,
        bom: &mut BillOfMaterials,
    ) -> EngineResult<()> {
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

        for line in catalog.product_lines(product_id) {
            let line_quantity = quantity * line.quantity;
            match line.source_type {
                SourceType::Ingredient => {
                    // 复合食材嵌套深度从本行重新起算
                    self.resolve_ingredient(
                        catalog,
                        &line.source_id,
                        line_quantity,
                        0,
                        path,
                        on_path,
                        bom,
                    )?;
                }
                SourceType::Product => {
                    let next_depth = product_depth + 1;
                    if next_depth > self.policy.max_product_depth {
                        return Err(EngineError::DepthExceeded {
                            depth: next_depth,
                            max_depth: self.policy.max_product_depth,
                        });
                    }
                    self.resolve_product(
                        catalog,
                        &line.source_id,
                        line_quantity,
                        next_depth,
                        path,
                        on_path,
                        bom,
                    )?;
                }
            }
        }

        path.pop();
        on_path.remove(&node_key);
        Ok(())
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for RecipeResolver {
    fn default() -> Self {
        Self::new()
    }
}
