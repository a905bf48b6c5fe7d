// ==========================================
// 餐厅后厨库存决策系统 - 库存 API
// ==========================================
// 职责: 销售/人工调整/盘点的扣减预览与落库、库存健康概览
// 红线: 预览不落库,落库必留痕
// 红线: blocking=true 的报告未经人工突破 (ForceOverride) 不得落库
// 红线: 全部增减量在单个事务内应用,避免并发销售的丢失更新
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::bom::BillOfMaterials;
use crate::domain::deduction::DeductionLogEntry;
use crate::domain::types::{SourceType, TriggerType};
use crate::domain::warning::{StockProjection, WarningReport};
use crate::engine::resolver::RecipeResolver;
use crate::engine::warning::StockWarningEngine;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::deduction_log_repo::DeductionLogRepository;
use crate::repository::ingredient_repo::IngredientRepository;

// ==========================================
// ApplyMode - 落库模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyMode {
    /// 常规模式: 存在阻断告警即拒绝
    Normal,
    /// 人工突破: 操作人确认后落库,审计记录 blocking_overridden
    ForceOverride,
}

// ==========================================
// DeductionPreview - 扣减预览
// ==========================================
// 请求级临时结果: BOM + 库存推演 + 告警报告,不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionPreview {
    pub bom: Option<BillOfMaterials>, // 销售扣减的展开清单 (人工调整/盘点无)
    pub projections: Vec<StockProjection>,
    pub report: WarningReport,
}

// ==========================================
// DeductionOutcome - 落库结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionOutcome {
    pub log_id: String,             // 审计记录ID
    pub updated_ingredients: usize, // 实际更新的食材数
    pub blocking_overridden: bool,  // 是否人工突破了阻断告警
    pub report: WarningReport,      // 落库时的告警报告快照
}

// ==========================================
// StockHealthSummary - 库存健康概览
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHealthSummary {
    pub total: usize,    // 食材总数
    pub negative: usize, // 库存为负 (数据异常,需盘点校正)
    pub depleted: usize, // 库存归零
    pub healthy: usize,  // 其余
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================

/// 库存API
///
/// 职责:
/// 1. 销售扣减预览 (BOM 展开 + 告警分级)
/// 2. 人工确认后的原子落库 + 审计
/// 3. 人工库存调整与盘点校正
/// 4. 库存健康概览
pub struct InventoryApi {
    ingredient_repo: Arc<IngredientRepository>,
    catalog_repo: Arc<CatalogRepository>,
    deduction_log_repo: Arc<DeductionLogRepository>,
    config: Arc<ConfigManager>,
    warning_engine: StockWarningEngine,
}

impl InventoryApi {
    /// 创建新的 InventoryApi 实例
    pub fn new(
        ingredient_repo: Arc<IngredientRepository>,
        catalog_repo: Arc<CatalogRepository>,
        deduction_log_repo: Arc<DeductionLogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            ingredient_repo,
            catalog_repo,
            deduction_log_repo,
            config,
            warning_engine: StockWarningEngine::new(),
        }
    }

    /// 从共享连接组装 (CLI / 测试用的装配入口)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(Self::new(
            Arc::new(IngredientRepository::from_connection(conn.clone())),
            Arc::new(CatalogRepository::from_connection(conn.clone())),
            Arc::new(DeductionLogRepository::from_connection(conn)),
            Arc::new(config),
        ))
    }

    fn low_stock_ratio(&self) -> ApiResult<f64> {
        self.config
            .get_low_stock_ratio()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }

    fn resolver(&self) -> ApiResult<RecipeResolver> {
        let policy = self
            .config
            .get_resolve_policy()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        Ok(RecipeResolver::with_policy(policy))
    }

    /// 按需求量映射构建库存推演行
    fn build_projections(
        &self,
        requirements: &HashMap<String, f64>,
    ) -> ApiResult<Vec<StockProjection>> {
        let mut projections = Vec::with_capacity(requirements.len());
        for (ingredient_id, required) in requirements {
            let ingredient = self
                .ingredient_repo
                .find_by_id(ingredient_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("食材(id={})不存在", ingredient_id))
                })?;
            projections.push(StockProjection {
                ingredient_id: ingredient.ingredient_id,
                ingredient_name: ingredient.name,
                unit: ingredient.unit,
                current_quantity: ingredient.quantity_on_hand,
                required_quantity: *required,
                proposed_quantity: ingredient.quantity_on_hand - required,
            });
        }
        // 推演行按食材ID稳定排序,便于展示与测试
        projections.sort_by(|a, b| a.ingredient_id.cmp(&b.ingredient_id));
        Ok(projections)
    }

    /// 阻断检查: blocking 且未人工突破即拒绝
    fn check_blocking(&self, report: &WarningReport, mode: ApplyMode) -> ApiResult<()> {
        if report.blocking && mode != ApplyMode::ForceOverride {
            return Err(ApiError::BlockingNotOverridden(format!(
                "存在 {} 条阻断性告警,需人工确认后重试",
                report
                    .warnings
                    .iter()
                    .filter(|w| w.severity == crate::domain::types::WarningSeverity::Critical)
                    .count()
            )));
        }
        Ok(())
    }

    /// 追加审计记录 (失败只告警,不影响主操作)
    #[allow(clippy::too_many_arguments)]
    fn append_log(
        &self,
        trigger_type: TriggerType,
        root_type: Option<SourceType>,
        root_id: Option<&str>,
        quantity: Option<f64>,
        blocking_overridden: bool,
        detail: serde_json::Value,
        operator: Option<&str>,
    ) -> String {
        let entry = DeductionLogEntry {
            log_id: Uuid::new_v4().to_string(),
            trigger_type,
            root_type,
            root_id: root_id.map(|s| s.to_string()),
            quantity,
            blocking_overridden,
            detail: detail.to_string(),
            operator: operator.map(|s| s.to_string()),
            created_at: Utc::now().naive_utc(),
        };
        if let Err(e) = self.deduction_log_repo.insert(&entry) {
            warn!(error = %e, "记录扣减审计失败");
        }
        entry.log_id
    }

    // ==========================================
    // 组合需求量的预览/落库 (销售批量导入复用)
    // ==========================================

    /// 对一组基础食材需求量做扣减预览 (无副作用)
    pub fn preview_requirements(
        &self,
        requirements: &HashMap<String, f64>,
    ) -> ApiResult<DeductionPreview> {
        let projections = self.build_projections(requirements)?;
        let report = self
            .warning_engine
            .evaluate(&projections, self.low_stock_ratio()?);
        Ok(DeductionPreview {
            bom: None,
            projections,
            report,
        })
    }

    /// 对一组基础食材需求量做原子落库 + 审计 (销售批量导入的提交入口)
    ///
    /// 整个批次一条审计记录; root 实体对批次无意义,留空
    pub fn apply_requirements(
        &self,
        requirements: &HashMap<String, f64>,
        mode: ApplyMode,
        trigger_type: TriggerType,
        detail: serde_json::Value,
        operator: &str,
    ) -> ApiResult<DeductionOutcome> {
        let preview = self.preview_requirements(requirements)?;
        self.check_blocking(&preview.report, mode)?;

        let updated = self.ingredient_repo.apply_deltas(requirements)?;

        let blocking_overridden = preview.report.blocking;
        let log_id = self.append_log(
            trigger_type,
            None,
            None,
            None,
            blocking_overridden,
            json!({
                "requirements": requirements,
                "report": &preview.report,
                "detail": detail,
            }),
            Some(operator),
        );

        Ok(DeductionOutcome {
            log_id,
            updated_ingredients: updated,
            blocking_overridden,
            report: preview.report,
        })
    }

    // ==========================================
    // 销售扣减
    // ==========================================

    /// 销售扣减预览: 展开产品 BOM 并分级告警,不落库
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity))]
    pub fn preview_sale(&self, product_id: &str, quantity: f64) -> ApiResult<DeductionPreview> {
        if quantity <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "售出份数必须为正: {}",
                quantity
            )));
        }

        let catalog = self.catalog_repo.load_full()?;
        let bom = self
            .resolver()?
            .resolve(&catalog, SourceType::Product, product_id, quantity)?;

        let projections = self.build_projections(&bom.requirements)?;
        let report = self
            .warning_engine
            .evaluate(&projections, self.low_stock_ratio()?);

        Ok(DeductionPreview {
            bom: Some(bom),
            projections,
            report,
        })
    }

    /// 销售扣减落库: 单个事务应用全部增减量 + 审计
    #[instrument(skip(self), fields(product_id = %product_id, quantity = quantity, mode = ?mode))]
    pub fn apply_sale(
        &self,
        product_id: &str,
        quantity: f64,
        mode: ApplyMode,
        operator: &str,
    ) -> ApiResult<DeductionOutcome> {
        let preview = self.preview_sale(product_id, quantity)?;
        self.check_blocking(&preview.report, mode)?;

        let bom = preview
            .bom
            .as_ref()
            .ok_or_else(|| ApiError::InternalError("销售预览缺少 BOM".to_string()))?;
        let updated = self.ingredient_repo.apply_deltas(&bom.requirements)?;

        let blocking_overridden = preview.report.blocking;
        let log_id = self.append_log(
            TriggerType::Sale,
            Some(SourceType::Product),
            Some(product_id),
            Some(quantity),
            blocking_overridden,
            json!({
                "requirements": &bom.requirements,
                "report": &preview.report,
            }),
            Some(operator),
        );

        info!(
            product_id = %product_id,
            quantity = quantity,
            updated = updated,
            blocking_overridden = blocking_overridden,
            "销售扣减已落库"
        );

        Ok(DeductionOutcome {
            log_id,
            updated_ingredients: updated,
            blocking_overridden,
            report: preview.report,
        })
    }

    // ==========================================
    // 人工库存调整
    // ==========================================

    /// 人工调整预览: 单食材 当前库存 -> 目标库存
    pub fn preview_manual_adjustment(
        &self,
        ingredient_id: &str,
        new_quantity: f64,
    ) -> ApiResult<DeductionPreview> {
        let ingredient = self
            .ingredient_repo
            .find_by_id(ingredient_id)?
            .ok_or_else(|| ApiError::NotFound(format!("食材(id={})不存在", ingredient_id)))?;

        let projections = vec![StockProjection {
            ingredient_id: ingredient.ingredient_id,
            ingredient_name: ingredient.name,
            unit: ingredient.unit,
            current_quantity: ingredient.quantity_on_hand,
            required_quantity: ingredient.quantity_on_hand - new_quantity,
            proposed_quantity: new_quantity,
        }];
        let report = self
            .warning_engine
            .evaluate(&projections, self.low_stock_ratio()?);

        Ok(DeductionPreview {
            bom: None,
            projections,
            report,
        })
    }

    /// 人工调整落库
    ///
    /// 红线: 操作原因必填 (可审计性)
    #[instrument(skip(self, reason), fields(ingredient_id = %ingredient_id, new_quantity = new_quantity, mode = ?mode))]
    pub fn apply_manual_adjustment(
        &self,
        ingredient_id: &str,
        new_quantity: f64,
        mode: ApplyMode,
        operator: &str,
        reason: &str,
    ) -> ApiResult<DeductionOutcome> {
        if reason.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "操作原因不能为空（可审计性要求）".to_string(),
            ));
        }

        let preview = self.preview_manual_adjustment(ingredient_id, new_quantity)?;
        self.check_blocking(&preview.report, mode)?;

        self.ingredient_repo.set_quantity(ingredient_id, new_quantity)?;

        let blocking_overridden = preview.report.blocking;
        let log_id = self.append_log(
            TriggerType::ManualEdit,
            Some(SourceType::Ingredient),
            Some(ingredient_id),
            Some(new_quantity),
            blocking_overridden,
            json!({
                "reason": reason,
                "projections": &preview.projections,
                "report": &preview.report,
            }),
            Some(operator),
        );

        Ok(DeductionOutcome {
            log_id,
            updated_ingredients: 1,
            blocking_overridden,
            report: preview.report,
        })
    }

    // ==========================================
    // 盘点校正
    // ==========================================

    /// 盘点预览: 每个食材 当前库存 -> 盘点量
    pub fn preview_physical_count(
        &self,
        counts: &[(String, f64)],
    ) -> ApiResult<DeductionPreview> {
        if counts.is_empty() {
            return Err(ApiError::InvalidInput("盘点清单不能为空".to_string()));
        }

        let mut projections = Vec::with_capacity(counts.len());
        for (ingredient_id, counted) in counts {
            let ingredient = self
                .ingredient_repo
                .find_by_id(ingredient_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("食材(id={})不存在", ingredient_id))
                })?;
            projections.push(StockProjection {
                ingredient_id: ingredient.ingredient_id,
                ingredient_name: ingredient.name,
                unit: ingredient.unit,
                current_quantity: ingredient.quantity_on_hand,
                required_quantity: ingredient.quantity_on_hand - counted,
                proposed_quantity: *counted,
            });
        }
        projections.sort_by(|a, b| a.ingredient_id.cmp(&b.ingredient_id));

        let report = self
            .warning_engine
            .evaluate(&projections, self.low_stock_ratio()?);

        Ok(DeductionPreview {
            bom: None,
            projections,
            report,
        })
    }

    /// 盘点落库: 全部校正量在单个事务内应用 + 审计
    #[instrument(skip(self, counts), fields(count = counts.len(), mode = ?mode))]
    pub fn apply_physical_count(
        &self,
        counts: &[(String, f64)],
        mode: ApplyMode,
        operator: &str,
    ) -> ApiResult<DeductionOutcome> {
        let preview = self.preview_physical_count(counts)?;
        self.check_blocking(&preview.report, mode)?;

        // 盘点量换算为扣减量,复用单事务的批量更新
        let deltas: HashMap<String, f64> = preview
            .projections
            .iter()
            .map(|p| (p.ingredient_id.clone(), p.required_quantity))
            .collect();
        let updated = self.ingredient_repo.apply_deltas(&deltas)?;

        let blocking_overridden = preview.report.blocking;
        let log_id = self.append_log(
            TriggerType::PhysicalCount,
            None,
            None,
            None,
            blocking_overridden,
            json!({
                "counts": counts.iter().map(|(id, q)| json!({"ingredient_id": id, "counted": q})).collect::<Vec<_>>(),
                "report": &preview.report,
            }),
            Some(operator),
        );

        Ok(DeductionOutcome {
            log_id,
            updated_ingredients: updated,
            blocking_overridden,
            report: preview.report,
        })
    }

    // ==========================================
    // 概览与审计查询
    // ==========================================

    /// 库存健康概览 (仪表盘协作方消费)
    pub fn stock_health_summary(&self) -> ApiResult<StockHealthSummary> {
        let ingredients = self.ingredient_repo.list_all()?;
        let mut summary = StockHealthSummary {
            total: ingredients.len(),
            negative: 0,
            depleted: 0,
            healthy: 0,
        };
        for ingredient in &ingredients {
            if ingredient.quantity_on_hand < 0.0 {
                summary.negative += 1;
            } else if ingredient.quantity_on_hand == 0.0 {
                summary.depleted += 1;
            } else {
                summary.healthy += 1;
            }
        }
        Ok(summary)
    }

    /// 查询最近的扣减审计记录
    pub fn recent_deductions(&self, limit: usize) -> ApiResult<Vec<DeductionLogEntry>> {
        Ok(self.deduction_log_repo.list_recent(limit)?)
    }
}
