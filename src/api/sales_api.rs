// ==========================================
// 餐厅后厨库存决策系统 - 销售 API
// ==========================================
// 职责: 销售文件批量导入 -> 聚合扣减预览 -> 人工确认后一次性落库
// 红线: 行错误只累积不中断; 整个批次一个事务、一条审计记录
// ==========================================

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::inventory_api::{ApplyMode, DeductionOutcome, DeductionPreview, InventoryApi};
use crate::config::ConfigManager;
use crate::domain::types::{SourceType, TriggerType};
use crate::engine::resolver::RecipeResolver;
use crate::importer::sales_importer::{SalesImportSummary, SalesImporter, SalesRowError};
use crate::importer::sales_importer_impl::SalesImporterImpl;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::product_repo::ProductRepository;

// ==========================================
// SalesImportPreview - 导入预览
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesImportPreview {
    pub summary: SalesImportSummary,           // 行级解析统计
    pub row_errors: Vec<SalesRowError>,        // 累积的行错误
    pub requirements: HashMap<String, f64>,    // 整批聚合后的基础食材需求量
    pub preview: Option<DeductionPreview>,     // 聚合扣减预览 (无有效行时为 None)
}

// ==========================================
// SalesImportResponse - 导入落库结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesImportResponse {
    pub summary: SalesImportSummary,
    pub row_errors: Vec<SalesRowError>,
    pub outcome: Option<DeductionOutcome>, // 无有效行时为 None (未落库)
}

// ==========================================
// SalesApi - 销售 API
// ==========================================

/// 销售API
///
/// 职责:
/// 1. 销售文件解析 (CSV/Excel,行错误累积)
/// 2. 整批聚合为一份组合 BOM
/// 3. 预览/落库两段式提交 (落库复用库存 API 的单事务扣减)
pub struct SalesApi {
    importer: SalesImporterImpl,
    inventory: Arc<InventoryApi>,
    catalog_repo: Arc<CatalogRepository>,
    config: Arc<ConfigManager>,
}

impl SalesApi {
    /// 创建新的 SalesApi 实例
    pub fn new(
        product_repo: Arc<ProductRepository>,
        inventory: Arc<InventoryApi>,
        catalog_repo: Arc<CatalogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            importer: SalesImporterImpl::new(product_repo),
            inventory,
            catalog_repo,
            config,
        }
    }

    /// 从共享连接组装 (CLI / 测试用的装配入口)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let inventory = Arc::new(InventoryApi::from_connection(conn.clone())?);
        Ok(Self::new(
            Arc::new(ProductRepository::from_connection(conn.clone())),
            inventory,
            Arc::new(CatalogRepository::from_connection(conn)),
            Arc::new(config),
        ))
    }

    fn resolver(&self) -> ApiResult<RecipeResolver> {
        let policy = self
            .config
            .get_resolve_policy()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(RecipeResolver::with_policy(policy))
    }

    /// 解析文件并聚合整批需求量
    async fn parse_and_aggregate(
        &self,
        file_path: &Path,
    ) -> ApiResult<(
        SalesImportSummary,
        Vec<SalesRowError>,
        HashMap<String, f64>,
    )> {
        let batch = self
            .importer
            .parse_sales_file(file_path)
            .await
            .map_err(|e| ApiError::ImportError(e.to_string()))?;

        // 一次装载目录快照,整批共用
        let catalog = self.catalog_repo.load_full()?;
        let resolver = self.resolver()?;

        let mut requirements: HashMap<String, f64> = HashMap::new();
        for record in &batch.records {
            let bom = resolver.resolve(
                &catalog,
                SourceType::Product,
                &record.product_id,
                record.quantity,
            )?;
            bom.fold_into(&mut requirements);
        }

        Ok((batch.summary, batch.row_errors, requirements))
    }

    /// 销售文件导入预览: 解析 + 聚合 + 扣减预览,不落库
    #[instrument(skip(self, file_path))]
    pub async fn preview_sales_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ApiResult<SalesImportPreview> {
        let (summary, row_errors, requirements) =
            self.parse_and_aggregate(file_path.as_ref()).await?;

        let preview = if requirements.is_empty() {
            None
        } else {
            Some(self.inventory.preview_requirements(&requirements)?)
        };

        Ok(SalesImportPreview {
            summary,
            row_errors,
            requirements,
            preview,
        })
    }

    /// 销售文件导入落库: 整批一个事务、一条审计记录
    ///
    /// # 参数
    /// - mode: 常规模式下存在阻断告警即拒绝; ForceOverride 为人工突破
    /// - operator: 操作人 (审计用)
    #[instrument(skip(self, file_path), fields(mode = ?mode, operator = %operator))]
    pub async fn import_sales_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        mode: ApplyMode,
        operator: &str,
    ) -> ApiResult<SalesImportResponse> {
        let path = file_path.as_ref();
        let (summary, row_errors, requirements) = self.parse_and_aggregate(path).await?;

        if requirements.is_empty() {
            info!(
                total_rows = summary.total_rows,
                failed = summary.failed,
                "销售文件无有效行,未落库"
            );
            return Ok(SalesImportResponse {
                summary,
                row_errors,
                outcome: None,
            });
        }

        let outcome = self.inventory.apply_requirements(
            &requirements,
            mode,
            TriggerType::SalesImport,
            json!({
                "file": path.display().to_string(),
                "summary": &summary,
                "row_errors": &row_errors,
            }),
            operator,
        )?;

        info!(
            parsed = summary.parsed,
            failed = summary.failed,
            updated = outcome.updated_ingredients,
            "销售文件导入已落库"
        );

        Ok(SalesImportResponse {
            summary,
            row_errors,
            outcome: Some(outcome),
        })
    }
}
