// ==========================================
// 餐厅后厨库存决策系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 引擎无状态、只读,所有规则必须输出 reason
// 红线: 目录快照由调用方装载,引擎不触碰数据库
// ==========================================

pub mod batch_scaler;
pub mod cost;
pub mod error;
pub mod resolver;
pub mod validator;
pub mod warning;

// 重导出核心引擎
pub use batch_scaler::BatchScaler;
pub use cost::CostCalculator;
pub use error::{EngineError, EngineResult};
pub use resolver::{RecipeResolver, ResolvePolicy, DEFAULT_MAX_PRODUCT_DEPTH};
pub use validator::{RecipeValidator, RecipeViolation};
pub use warning::{StockWarningEngine, DEFAULT_LOW_STOCK_RATIO};
