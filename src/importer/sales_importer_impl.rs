// ==========================================
// 餐厅后厨库存决策系统 - 销售导入实现
// ==========================================
// 职责: 销售文件 -> 已匹配产品的销售记录批次
// 红线: 行错误只累积不中断,文件级错误才整体失败
// ==========================================

use crate::domain::sales::SalesRecord;
use crate::importer::error::ImportError;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::sales_importer::{
    ParsedSalesBatch, SalesImportSummary, SalesImporter, SalesRowError,
};
use crate::repository::product_repo::ProductRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// SalesImporterImpl - 销售导入器
// ==========================================
pub struct SalesImporterImpl {
    product_repo: Arc<ProductRepository>,
    field_mapper: FieldMapper,
}

impl SalesImporterImpl {
    /// 创建新的销售导入器
    ///
    /// # 参数
    /// - product_repo: 产品仓储 (产品匹配用)
    pub fn new(product_repo: Arc<ProductRepository>) -> Self {
        Self {
            product_repo,
            field_mapper: FieldMapper::new(),
        }
    }

    /// 产品匹配: 先按产品ID,再按产品名称
    fn match_product(
        &self,
        product_ref: &str,
        name_index: &HashMap<String, String>,
        row_number: usize,
    ) -> Result<String, ImportError> {
        if let Some(product) = self
            .product_repo
            .find_by_id(product_ref)
            .map_err(|e| ImportError::DatabaseQueryError(e.to_string()))?
        {
            return Ok(product.product_id);
        }

        if let Some(product_id) = name_index.get(product_ref) {
            return Ok(product_id.clone());
        }

        Err(ImportError::ProductNotFound {
            row: row_number,
            reference: product_ref.to_string(),
        })
    }
}

#[async_trait]
impl SalesImporter for SalesImporterImpl {
    async fn parse_sales_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ParsedSalesBatch, Box<dyn Error>> {
        let path = file_path.as_ref();
        info!(path = %path.display(), "开始解析销售文件");

        // 阶段 0: 文件读取与解析 (文件级错误整体失败)
        let raw_rows = UniversalFileParser.parse(path)?;
        let total_rows = raw_rows.len();

        // 产品名称索引 (一次装载,避免逐行查询)
        let name_index: HashMap<String, String> = self
            .product_repo
            .list_all()
            .map_err(|e| ImportError::DatabaseQueryError(e.to_string()))?
            .into_iter()
            .map(|p| (p.name, p.product_id))
            .collect();

        let mut records = Vec::new();
        let mut row_errors = Vec::new();

        for (idx, raw_row) in raw_rows.iter().enumerate() {
            let row_number = idx + 1;

            // 阶段 1: 字段映射与类型转换
            let raw = match self.field_mapper.map_to_raw_sales(raw_row, row_number) {
                Ok(raw) => raw,
                Err(e) => {
                    row_errors.push(SalesRowError {
                        row: row_number,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            // 阶段 2: 行校验
            if raw.quantity <= 0.0 {
                row_errors.push(SalesRowError {
                    row: row_number,
                    message: ImportError::InvalidQuantity {
                        row: row_number,
                        value: raw.quantity,
                    }
                    .to_string(),
                });
                continue;
            }

            // 阶段 3: 产品匹配
            match self.match_product(&raw.product_ref, &name_index, row_number) {
                Ok(product_id) => {
                    records.push(SalesRecord {
                        product_id,
                        quantity: raw.quantity,
                        sold_at: raw.sold_at,
                        source_row: Some(row_number),
                    });
                }
                Err(e) => {
                    row_errors.push(SalesRowError {
                        row: row_number,
                        message: e.to_string(),
                    });
                }
            }
        }

        if !row_errors.is_empty() {
            warn!(
                total_rows = total_rows,
                failed = row_errors.len(),
                "销售文件部分行解析失败"
            );
        }

        let summary = SalesImportSummary {
            total_rows,
            parsed: records.len(),
            failed: row_errors.len(),
        };

        info!(
            total_rows = summary.total_rows,
            parsed = summary.parsed,
            failed = summary.failed,
            "销售文件解析完成"
        );

        Ok(ParsedSalesBatch {
            records,
            row_errors,
            summary,
        })
    }
}
