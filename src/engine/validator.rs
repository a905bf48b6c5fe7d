// ==========================================
// 餐厅后厨库存决策系统 - 配方校验引擎
// ==========================================
// 职责: 配方编辑落库前的静态校验
// 输入: 配方目录 + 待保存配方行
// 输出: 违规列表 (全部检查独立运行并累积,不短路)
// ==========================================
// 红线: 校验只读,不产生任何落库
// 红线: 所有违规必须输出可解释 reason
// ==========================================

use crate::domain::catalog::RecipeCatalog;
use crate::domain::ingredient::CompositeRecipeLine;
use crate::domain::product::ProductRecipeLine;
use crate::domain::types::{SourceType, ViolationType};
use crate::engine::resolver::DEFAULT_MAX_PRODUCT_DEPTH;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

// ==========================================
// RecipeViolation - 配方违规详情
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeViolation {
    pub violation_type: ViolationType,      // 违规类型
    pub line_no: Option<i32>,               // 所在配方行号
    pub source_id: String,                  // 涉事引用ID
    pub reason: String,                     // 可解释原因
    pub details: Option<serde_json::Value>, // 额外信息
}

// ==========================================
// RecipeValidator - 配方校验引擎
// ==========================================
// 无状态引擎,深度上限由构造时传入
pub struct RecipeValidator {
    max_product_depth: usize,
}

impl RecipeValidator {
    /// 使用默认深度上限构造
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_PRODUCT_DEPTH)
    }

    /// 使用指定深度上限构造
    pub fn with_max_depth(max_product_depth: usize) -> Self {
        Self { max_product_depth }
    }

    // ==========================================
    // 产品配方校验
    // ==========================================

    /// 校验一组待保存的产品配方行
    ///
    /// # 参数
    /// - `catalog`: 配方目录快照 (含各产品的现有配方)
    /// - `product_id`: 被编辑产品ID; None 表示尚未落库的新产品,
    ///   此时自引用检查无对象,自动跳过
    /// - `proposed_lines`: 待保存配方行
    ///
    /// # 返回
    /// 违规列表; 空列表表示可以落库
    ///
    /// # 检查项 (独立运行,全部累积)
    /// 1. 自引用: 产品行引用了被编辑产品自身
    /// 2. 循环依赖: 被引用产品的现有配方展开后回到被编辑产品
    /// 3. 深度超限: 被引用产品嵌套深度 + 1 超过上限
    /// 4. 悬挂引用 / 非正数量 (数据质量)
    pub fn validate_product_recipe(
        &self,
        catalog: &RecipeCatalog,
        product_id: Option<&str>,
        proposed_lines: &[ProductRecipeLine],
    ) -> Vec<RecipeViolation> {
        let mut violations = Vec::new();

        for line in proposed_lines {
            // 数据质量: 数量必须为正
            if line.quantity <= 0.0 {
                violations.push(RecipeViolation {
                    violation_type: ViolationType::NonPositiveQuantity,
                    line_no: Some(line.line_no),
                    source_id: line.source_id.clone(),
                    reason: format!("配方行数量必须为正: {}", line.quantity),
                    details: Some(json!({ "quantity": line.quantity })),
                });
            }

            match line.source_type {
                SourceType::Ingredient => {
                    if catalog.ingredient(&line.source_id).is_none() {
                        violations.push(RecipeViolation {
                            violation_type: ViolationType::UnknownSource,
                            line_no: Some(line.line_no),
                            source_id: line.source_id.clone(),
                            reason: format!("引用的食材不存在: {}", line.source_id),
                            details: None,
                        });
                    }
                }
                SourceType::Product => {
                    // 自引用
                    if product_id == Some(line.source_id.as_str()) {
                        violations.push(RecipeViolation {
                            violation_type: ViolationType::SelfReference,
                            line_no: Some(line.line_no),
                            source_id: line.source_id.clone(),
                            reason: format!("配方行引用了正在编辑的产品自身: {}", line.source_id),
                            details: None,
                        });
                        continue;
                    }

                    if catalog.product(&line.source_id).is_none() {
                        violations.push(RecipeViolation {
                            violation_type: ViolationType::UnknownSource,
                            line_no: Some(line.line_no),
                            source_id: line.source_id.clone(),
                            reason: format!("引用的产品不存在: {}", line.source_id),
                            details: None,
                        });
                        continue;
                    }

                    // 循环依赖: 展开被引用产品的现有配方
                    if let Some(edited_id) = product_id {
                        if let Some(cycle_path) =
                            self.find_product_route(catalog, &line.source_id, edited_id)
                        {
                            violations.push(RecipeViolation {
                                violation_type: ViolationType::CircularDependency,
                                line_no: Some(line.line_no),
                                source_id: line.source_id.clone(),
                                reason: format!(
                                    "产品 {} 的现有配方会回到 {} (路径: {})",
                                    line.source_id,
                                    edited_id,
                                    cycle_path.join(" -> ")
                                ),
                                details: Some(json!({ "path": cycle_path })),
                            });
                        }
                    }

                    // 深度超限: 被引用产品自身深度 + 本行引入的一层
                    let mut on_path = HashSet::new();
                    let referenced_depth =
                        self.product_nesting_depth(catalog, &line.source_id, &mut on_path);
                    let combined_depth = referenced_depth + 1;
                    if combined_depth > self.max_product_depth {
                        violations.push(RecipeViolation {
                            violation_type: ViolationType::DepthExceeded,
                            line_no: Some(line.line_no),
                            source_id: line.source_id.clone(),
                            reason: format!(
                                "引用产品 {} 后嵌套深度达到 {},超过上限 {}",
                                line.source_id, combined_depth, self.max_product_depth
                            ),
                            details: Some(json!({
                                "combined_depth": combined_depth,
                                "max_depth": self.max_product_depth,
                            })),
                        });
                    }
                }
            }
        }

        violations
    }

    // ==========================================
    // 复合食材配方校验
    // ==========================================

    /// 校验一组待保存的复合食材批次配方行
    ///
    /// # 检查项
    /// 1. 自环: 配方行引用复合食材自身 (本边不变量)
    /// 2. 循环依赖: 被引用复合食材的现有配方展开后回到被编辑食材
    /// 3. 悬挂引用 / 非正数量 (数据质量)
    pub fn validate_composite_recipe(
        &self,
        catalog: &RecipeCatalog,
        composite_id: &str,
        proposed_lines: &[CompositeRecipeLine],
    ) -> Vec<RecipeViolation> {
        let mut violations = Vec::new();

        for line in proposed_lines {
            if line.quantity_per_batch <= 0.0 {
                violations.push(RecipeViolation {
                    violation_type: ViolationType::NonPositiveQuantity,
                    line_no: Some(line.line_no),
                    source_id: line.base_ingredient_id.clone(),
                    reason: format!("配方行每批次用量必须为正: {}", line.quantity_per_batch),
                    details: Some(json!({ "quantity_per_batch": line.quantity_per_batch })),
                });
            }

            // 自环
            if line.base_ingredient_id == composite_id {
                violations.push(RecipeViolation {
                    violation_type: ViolationType::SelfReference,
                    line_no: Some(line.line_no),
                    source_id: line.base_ingredient_id.clone(),
                    reason: format!("配方行引用了正在编辑的复合食材自身: {}", composite_id),
                    details: None,
                });
                continue;
            }

            let referenced = match catalog.ingredient(&line.base_ingredient_id) {
                Some(ing) => ing,
                None => {
                    violations.push(RecipeViolation {
                        violation_type: ViolationType::UnknownSource,
                        line_no: Some(line.line_no),
                        source_id: line.base_ingredient_id.clone(),
                        reason: format!("引用的食材不存在: {}", line.base_ingredient_id),
                        details: None,
                    });
                    continue;
                }
            };

            // 循环依赖只可能经由复合食材边
            if referenced.is_composite {
                if let Some(cycle_path) =
                    self.find_composite_route(catalog, &line.base_ingredient_id, composite_id)
                {
                    violations.push(RecipeViolation {
                        violation_type: ViolationType::CircularDependency,
                        line_no: Some(line.line_no),
                        source_id: line.base_ingredient_id.clone(),
                        reason: format!(
                            "复合食材 {} 的现有配方会回到 {} (路径: {})",
                            line.base_ingredient_id,
                            composite_id,
                            cycle_path.join(" -> ")
                        ),
                        details: Some(json!({ "path": cycle_path })),
                    });
                }
            }
        }

        violations
    }

    // ==========================================
    // 图遍历辅助
    // ==========================================

    /// 在产品引用图上查找 from 到 target 的路径
    ///
    /// # 返回
    /// - Some(path): from 的现有配方展开后可达 target,path 含两端
    /// - None: 不可达
    fn find_product_route(
        &self,
        catalog: &RecipeCatalog,
        from: &str,
        target: &str,
    ) -> Option<Vec<String>> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        self.search_product(catalog, from, target, &mut path, &mut visited)
    }

    fn search_product(
        &self,
        catalog: &RecipeCatalog,
        current: &str,
        target: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        // 现有数据中已存在的环不在此处报告,仅防止死循环
        if !visited.insert(current.to_string()) {
            return None;
        }
        path.push(current.to_string());

        for line in catalog.product_lines(current) {
            if line.source_type != SourceType::Product {
                continue;
            }
            if line.source_id == target {
                let mut route = path.clone();
                route.push(target.to_string());
                path.pop();
                return Some(route);
            }
            if let Some(route) = self.search_product(catalog, &line.source_id, target, path, visited)
            {
                path.pop();
                return Some(route);
            }
        }

        path.pop();
        None
    }

    /// 在复合食材引用图上查找 from 到 target 的路径
    fn find_composite_route(
        &self,
        catalog: &RecipeCatalog,
        from: &str,
        target: &str,
    ) -> Option<Vec<String>> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        self.search_composite(catalog, from, target, &mut path, &mut visited)
    }

    fn search_composite(
        &self,
        catalog: &RecipeCatalog,
        current: &str,
        target: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        if !visited.insert(current.to_string()) {
            return None;
        }
        path.push(current.to_string());

        for line in catalog.composite_lines(current) {
            if line.base_ingredient_id == target {
                let mut route = path.clone();
                route.push(target.to_string());
                path.pop();
                return Some(route);
            }
            if let Some(route) =
                self.search_composite(catalog, &line.base_ingredient_id, target, path, visited)
            {
                path.pop();
                return Some(route);
            }
        }

        path.pop();
        None
    }

    /// 产品的现有最大嵌套深度 (无产品行时为 0)
    ///
    /// on_path 防止现有数据中的环导致无限递归,
    /// 环本身由循环依赖检查单独报告
    fn product_nesting_depth(
        &self,
        catalog: &RecipeCatalog,
        product_id: &str,
        on_path: &mut HashSet<String>,
    ) -> usize {
        if !on_path.insert(product_id.to_string()) {
            return 0;
        }

        let mut depth = 0;
        for line in catalog.product_lines(product_id) {
            if line.source_type == SourceType::Product {
                depth = depth.max(1 + self.product_nesting_depth(catalog, &line.source_id, on_path));
            }
        }

        on_path.remove(product_id);
        depth
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for RecipeValidator {
    fn default() -> Self {
        Self::new()
    }
}
