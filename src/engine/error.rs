// ==========================================
// 餐厅后厨库存决策系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 所有错误在请求边界可恢复,引擎不持有可被破坏的状态
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// 配方图存在环 (校验器先行时不应到达,解析/成本引擎的兜底防线)
    #[error("配方循环引用: 节点 {node_id} 在展开路径中重复出现 (路径: {path})")]
    CycleDetected { node_id: String, path: String },

    /// 嵌套深度超过配置上限
    #[error("配方嵌套深度超限: depth={depth}, max={max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    /// 复合食材批次产出量缺失或非正
    #[error("无效批次产量: ingredient_id={ingredient_id}, batch_size={batch_size}")]
    InvalidBatchSize {
        ingredient_id: String,
        batch_size: f64,
    },

    /// 目录快照中缺少被引用的实体 (悬挂引用)
    #[error("实体未找到: {entity} (id={id})")]
    EntityNotFound { entity: String, id: String },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
