// ==========================================
// 餐厅后厨库存决策系统 - API 层
// ==========================================
// 职责: 组合仓储与引擎,提供业务 API; 预览/落库两段式提交
// ==========================================

pub mod error;
pub mod inventory_api;
pub mod recipe_api;
pub mod sales_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use inventory_api::{
    ApplyMode, DeductionOutcome, DeductionPreview, InventoryApi, StockHealthSummary,
};
pub use recipe_api::RecipeApi;
pub use sales_api::{SalesApi, SalesImportPreview, SalesImportResponse};
