// ==========================================
// 餐厅后厨库存决策系统 - 销售导入 Trait
// ==========================================
// 职责: 定义销售文件导入接口 (不包含实现)
// ==========================================

use crate::domain::sales::SalesRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

// ==========================================
// SalesRowError - 单行导入错误
// ==========================================
// 行错误只累积不致命: 文件中其余行照常导入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRowError {
    pub row: usize,      // 数据行号 (从 1 开始,不含表头)
    pub message: String, // 可解释原因
}

// ==========================================
// SalesImportSummary - 导入汇总统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesImportSummary {
    pub total_rows: usize, // 文件中的数据行数
    pub parsed: usize,     // 解析并匹配成功的行数
    pub failed: usize,     // 失败行数
}

// ==========================================
// ParsedSalesBatch - 解析后的销售批次
// ==========================================
// 导入器的输出: 已匹配产品的销售记录 + 累积的行错误;
// 聚合、预览与落库由销售 API 负责
#[derive(Debug, Clone)]
pub struct ParsedSalesBatch {
    pub records: Vec<SalesRecord>,
    pub row_errors: Vec<SalesRowError>,
    pub summary: SalesImportSummary,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口 (阶段 0)
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录 (HashMap<列名, 值>)
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn Error>>;
}

// ==========================================
// SalesImporter Trait
// ==========================================
// 用途: 销售导入主接口
// 实现者: SalesImporterImpl
#[async_trait]
pub trait SalesImporter: Send + Sync {
    /// 解析销售文件为销售记录批次
    ///
    /// # 参数
    /// - file_path: 文件路径 (.csv/.xlsx/.xls)
    ///
    /// # 返回
    /// - Ok(ParsedSalesBatch): 成功行 + 累积的行错误
    /// - Err: 文件级错误 (不存在/格式不支持/解析失败)
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 字段映射与类型转换
    /// 3. 行校验 (数量 > 0)
    /// 4. 产品匹配 (按产品ID,再按产品名称)
    async fn parse_sales_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ParsedSalesBatch, Box<dyn Error>>;
}
