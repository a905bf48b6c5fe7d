// ==========================================
// 餐厅后厨库存决策系统 - 配方目录装载仓储
// ==========================================
// 职责: 把四张实体表一次性装载为内存目录快照
// 红线: 引擎只消费快照,装载与计算分离
// ==========================================

use crate::domain::catalog::RecipeCatalog;
use crate::repository::composite_recipe_repo::CompositeRecipeRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::ingredient_repo::IngredientRepository;
use crate::repository::product_recipe_repo::ProductRecipeRepository;
use crate::repository::product_repo::ProductRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// CatalogRepository - 目录装载仓储
// ==========================================

/// 目录装载仓储
/// 组合四个实体仓储,输出请求级 RecipeCatalog 快照
pub struct CatalogRepository {
    ingredient_repo: IngredientRepository,
    composite_recipe_repo: CompositeRecipeRepository,
    product_repo: ProductRepository,
    product_recipe_repo: ProductRecipeRepository,
}

impl CatalogRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            ingredient_repo: IngredientRepository::from_connection(conn.clone()),
            composite_recipe_repo: CompositeRecipeRepository::from_connection(conn.clone()),
            product_repo: ProductRepository::from_connection(conn.clone()),
            product_recipe_repo: ProductRecipeRepository::from_connection(conn),
        }
    }

    /// 装载完整目录快照
    ///
    /// 餐厅量级的实体规模 (数百食材/产品) 下全量装载即可,
    /// 无需增量加载
    pub fn load_full(&self) -> RepositoryResult<RecipeCatalog> {
        let mut catalog = RecipeCatalog::new();

        for ingredient in self.ingredient_repo.list_all()? {
            catalog.insert_ingredient(ingredient);
        }
        for line in self.composite_recipe_repo.list_all()? {
            catalog.insert_composite_line(line);
        }
        for product in self.product_repo.list_all()? {
            catalog.insert_product(product);
        }
        for line in self.product_recipe_repo.list_all()? {
            catalog.insert_product_line(line);
        }

        debug!(
            ingredients = catalog.ingredient_count(),
            products = catalog.product_count(),
            "配方目录快照装载完成"
        );

        Ok(catalog)
    }
}
