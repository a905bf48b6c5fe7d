// ==========================================
// 餐厅后厨库存决策系统 - 配方 API
// ==========================================
// 职责: 食材/产品主数据维护、配方编辑与校验、成本查询、BOM 预览
// 红线: 校验存在违规时拒绝落库; 被配方引用的实体不可删除
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::bom::BillOfMaterials;
use crate::domain::catalog::RecipeCatalog;
use crate::domain::ingredient::{CompositeRecipeLine, Ingredient};
use crate::domain::product::{Product, ProductRecipeLine};
use crate::domain::types::SourceType;
use crate::engine::cost::CostCalculator;
use crate::engine::resolver::RecipeResolver;
use crate::engine::validator::{RecipeValidator, RecipeViolation};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::composite_recipe_repo::CompositeRecipeRepository;
use crate::repository::ingredient_repo::IngredientRepository;
use crate::repository::product_recipe_repo::ProductRecipeRepository;
use crate::repository::product_repo::ProductRepository;

// ==========================================
// RecipeApi - 配方 API
// ==========================================

/// 配方API
///
/// 职责:
/// 1. 食材/产品主数据维护
/// 2. 配方整体替换 (先校验后落库)
/// 3. 成本查询 (始终按当前基础食材单价自底向上重算)
/// 4. BOM 预览
pub struct RecipeApi {
    ingredient_repo: Arc<IngredientRepository>,
    product_repo: Arc<ProductRepository>,
    composite_recipe_repo: Arc<CompositeRecipeRepository>,
    product_recipe_repo: Arc<ProductRecipeRepository>,
    catalog_repo: Arc<CatalogRepository>,
    config: Arc<ConfigManager>,
}

impl RecipeApi {
    /// 创建新的 RecipeApi 实例
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        product_repo: Arc<ProductRepository>,
        composite_recipe_repo: Arc<CompositeRecipeRepository>,
        product_recipe_repo: Arc<ProductRecipeRepository>,
        catalog_repo: Arc<CatalogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            ingredient_repo,
            product_repo,
            composite_recipe_repo,
            product_recipe_repo,
            catalog_repo,
            config,
        }
    }

    /// 从共享连接组装 (CLI / 测试用的装配入口)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(Self::new(
            Arc::new(IngredientRepository::from_connection(conn.clone())),
            Arc::new(ProductRepository::from_connection(conn.clone())),
            Arc::new(CompositeRecipeRepository::from_connection(conn.clone())),
            Arc::new(ProductRecipeRepository::from_connection(conn.clone())),
            Arc::new(CatalogRepository::from_connection(conn)),
            Arc::new(config),
        ))
    }

    /// 装载目录快照
    fn load_catalog(&self) -> ApiResult<RecipeCatalog> {
        Ok(self.catalog_repo.load_full()?)
    }

    /// 按配置组装解析引擎
    fn resolver(&self) -> ApiResult<RecipeResolver> {
        let policy = self
            .config
            .get_resolve_policy()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(RecipeResolver::with_policy(policy))
    }

    /// 按配置组装配方校验器
    fn validator(&self) -> ApiResult<RecipeValidator> {
        let max_depth = self
            .config
            .get_max_product_depth()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(RecipeValidator::with_max_depth(max_depth))
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询全部食材
    pub fn list_ingredients(&self) -> ApiResult<Vec<Ingredient>> {
        Ok(self.ingredient_repo.list_all()?)
    }

    /// 查询全部产品
    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_all()?)
    }

    /// 查询食材详情
    pub fn get_ingredient(&self, ingredient_id: &str) -> ApiResult<Option<Ingredient>> {
        if ingredient_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("食材ID不能为空".to_string()));
        }
        Ok(self.ingredient_repo.find_by_id(ingredient_id)?)
    }

    /// 查询产品详情 (含配方行)
    pub fn get_product_detail(
        &self,
        product_id: &str,
    ) -> ApiResult<Option<(Product, Vec<ProductRecipeLine>)>> {
        if product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }
        let product = self.product_repo.find_by_id(product_id)?;
        match product {
            Some(p) => {
                let lines = self.product_recipe_repo.lines_for(product_id)?;
                Ok(Some((p, lines)))
            }
            None => Ok(None),
        }
    }

    // ==========================================
    // 成本与 BOM
    // ==========================================

    /// 产品单位成本 (按当前基础食材单价自底向上重算)
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn product_unit_cost(&self, product_id: &str) -> ApiResult<f64> {
        let catalog = self.load_catalog()?;
        let cost = CostCalculator::new().total_cost(&catalog, SourceType::Product, product_id)?;
        Ok(cost)
    }

    /// 食材单位成本 (复合食材为派生成本,基础食材为标定单价)
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id))]
    pub fn ingredient_unit_cost(&self, ingredient_id: &str) -> ApiResult<f64> {
        let catalog = self.load_catalog()?;
        let cost =
            CostCalculator::new().total_cost(&catalog, SourceType::Ingredient, ingredient_id)?;
        Ok(cost)
    }

    /// BOM 预览: 展开根实体为基础食材需求清单 (无副作用)
    #[instrument(skip(self), fields(root_type = %root_type, root_id = %root_id, quantity = quantity))]
    pub fn preview_bom(
        &self,
        root_type: SourceType,
        root_id: &str,
        quantity: f64,
    ) -> ApiResult<BillOfMaterials> {
        if quantity <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "需求量必须为正: {}",
                quantity
            )));
        }
        let catalog = self.load_catalog()?;
        let bom = self
            .resolver()?
            .resolve(&catalog, root_type, root_id, quantity)?;
        Ok(bom)
    }

    // ==========================================
    // 配方校验与落库
    // ==========================================

    /// 校验产品配方草案 (纯检查,所有违规一次性返回)
    ///
    /// # 参数
    /// - product_id: 被编辑产品ID; None 表示尚未持久化的新产品
    pub fn validate_product_recipe(
        &self,
        product_id: Option<&str>,
        proposed_lines: &[ProductRecipeLine],
    ) -> ApiResult<Vec<RecipeViolation>> {
        let catalog = self.load_catalog()?;
        Ok(self
            .validator()?
            .validate_product_recipe(&catalog, product_id, proposed_lines))
    }

    /// 校验复合食材配方草案
    pub fn validate_composite_recipe(
        &self,
        composite_id: &str,
        proposed_lines: &[CompositeRecipeLine],
    ) -> ApiResult<Vec<RecipeViolation>> {
        let catalog = self.load_catalog()?;
        Ok(self
            .validator()?
            .validate_composite_recipe(&catalog, composite_id, proposed_lines))
    }

    /// 保存产品配方 (整体替换,单个事务)
    ///
    /// 红线: 存在任何违规即拒绝落库
    #[instrument(skip(self, proposed_lines), fields(product_id = %product_id, lines = proposed_lines.len()))]
    pub fn save_product_recipe(
        &self,
        product_id: &str,
        proposed_lines: &[ProductRecipeLine],
    ) -> ApiResult<usize> {
        if self.product_repo.find_by_id(product_id)?.is_none() {
            return Err(ApiError::NotFound(format!("产品(id={})不存在", product_id)));
        }

        let violations = self.validate_product_recipe(Some(product_id), proposed_lines)?;
        if !violations.is_empty() {
            return Err(ApiError::RecipeValidationFailed {
                reason: format!("产品 {} 的配方存在 {} 项违规", product_id, violations.len()),
                violations,
            });
        }

        let inserted = self
            .product_recipe_repo
            .replace_lines(product_id, proposed_lines)?;
        info!(product_id = %product_id, lines = inserted, "产品配方已保存");
        Ok(inserted)
    }

    /// 保存复合食材配方 (整体替换,单个事务)
    #[instrument(skip(self, proposed_lines), fields(composite_id = %composite_id, lines = proposed_lines.len()))]
    pub fn save_composite_recipe(
        &self,
        composite_id: &str,
        proposed_lines: &[CompositeRecipeLine],
    ) -> ApiResult<usize> {
        let ingredient = self
            .ingredient_repo
            .find_by_id(composite_id)?
            .ok_or_else(|| ApiError::NotFound(format!("食材(id={})不存在", composite_id)))?;
        if !ingredient.is_composite {
            return Err(ApiError::BusinessRuleViolation(format!(
                "食材 {} 不是复合食材,不可挂配方",
                composite_id
            )));
        }

        let violations = self.validate_composite_recipe(composite_id, proposed_lines)?;
        if !violations.is_empty() {
            return Err(ApiError::RecipeValidationFailed {
                reason: format!(
                    "复合食材 {} 的配方存在 {} 项违规",
                    composite_id,
                    violations.len()
                ),
                violations,
            });
        }

        let inserted = self
            .composite_recipe_repo
            .replace_lines(composite_id, proposed_lines)?;
        info!(composite_id = %composite_id, lines = inserted, "复合食材配方已保存");
        Ok(inserted)
    }

    // ==========================================
    // 主数据维护
    // ==========================================

    /// 保存食材 (新建或编辑)
    pub fn save_ingredient(&self, ingredient: &Ingredient) -> ApiResult<()> {
        if ingredient.ingredient_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("食材ID不能为空".to_string()));
        }
        if ingredient.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("食材名称不能为空".to_string()));
        }
        if ingredient.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("食材编码不能为空".to_string()));
        }
        if ingredient.unit_cost < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "单位成本不能为负: {}",
                ingredient.unit_cost
            )));
        }
        // 批次产出量与复合标志必须成对出现
        if ingredient.is_composite && ingredient.effective_batch_size().is_none() {
            return Err(ApiError::InvalidInput(format!(
                "复合食材必须提供正的批次产出量: {:?}",
                ingredient.batch_size
            )));
        }
        if !ingredient.is_composite && ingredient.batch_size.is_some() {
            return Err(ApiError::InvalidInput(
                "非复合食材不可设置批次产出量".to_string(),
            ));
        }

        self.ingredient_repo.upsert(ingredient)?;
        Ok(())
    }

    /// 保存产品 (新建或编辑)
    pub fn save_product(&self, product: &Product) -> ApiResult<()> {
        if product.product_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品ID不能为空".to_string()));
        }
        if product.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品名称不能为空".to_string()));
        }
        if product.selling_price < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "售价不能为负: {}",
                product.selling_price
            )));
        }

        self.product_repo.upsert(product)?;
        Ok(())
    }

    /// 删除食材 (被任何配方行引用时拒绝)
    pub fn delete_ingredient(&self, ingredient_id: &str) -> ApiResult<()> {
        Ok(self.ingredient_repo.delete(ingredient_id)?)
    }

    /// 删除产品 (被其他产品配方引用时拒绝; 连带删除其配方行)
    pub fn delete_product(&self, product_id: &str) -> ApiResult<()> {
        Ok(self.product_repo.delete(product_id)?)
    }
}
