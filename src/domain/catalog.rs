// ==========================================
// 餐厅后厨库存决策系统 - 配方目录快照
// ==========================================
// 职责: 引擎计算所需的内存邻接快照
// 红线: 引擎不拼 SQL,所有图遍历在本快照上完成
// 生命周期: 请求级,由调用方从仓储一次性装载
// ==========================================

use crate::domain::ingredient::{CompositeRecipeLine, Ingredient};
use crate::domain::product::{Product, ProductRecipeLine};
use std::collections::HashMap;

// ==========================================
// RecipeCatalog - 配方目录
// ==========================================
// 显式有向图: 节点为食材/产品ID,邻接表为配方行
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    ingredients: HashMap<String, Ingredient>,
    composite_lines: HashMap<String, Vec<CompositeRecipeLine>>,
    products: HashMap<String, Product>,
    product_lines: HashMap<String, Vec<ProductRecipeLine>>,
}

impl RecipeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 装载
    // ==========================================

    /// 加入食材
    pub fn insert_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients
            .insert(ingredient.ingredient_id.clone(), ingredient);
    }

    /// 加入一条复合食材配方行
    pub fn insert_composite_line(&mut self, line: CompositeRecipeLine) {
        self.composite_lines
            .entry(line.composite_id.clone())
            .or_default()
            .push(line);
    }

    /// 加入产品
    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.product_id.clone(), product);
    }

    /// 加入一条产品配方行
    pub fn insert_product_line(&mut self, line: ProductRecipeLine) {
        self.product_lines
            .entry(line.product_id.clone())
            .or_default()
            .push(line);
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按ID查询食材
    pub fn ingredient(&self, ingredient_id: &str) -> Option<&Ingredient> {
        self.ingredients.get(ingredient_id)
    }

    /// 按ID查询产品
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    /// 复合食材的批次配方行 (无配方时返回空)
    pub fn composite_lines(&self, composite_id: &str) -> &[CompositeRecipeLine] {
        self.composite_lines
            .get(composite_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 产品的配方行 (无配方时返回空)
    pub fn product_lines(&self, product_id: &str) -> &[ProductRecipeLine] {
        self.product_lines
            .get(product_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 食材总数
    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    /// 产品总数
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// 遍历全部食材
    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.values()
    }
}
