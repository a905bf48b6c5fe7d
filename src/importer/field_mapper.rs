// ==========================================
// 餐厅后厨库存决策系统 - 销售字段映射器
// ==========================================
// 职责: 原始行记录 (HashMap<列名, 值>) -> RawSalesRecord
// 支持中英文列名别名; 产品匹配在导入器中进行
// ==========================================

use crate::domain::sales::RawSalesRecord;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// 产品引用列别名 (按优先级)
const PRODUCT_REF_ALIASES: [&str; 4] = ["产品ID", "产品编号", "产品名称", "product_id"];

/// 数量列别名
const QUANTITY_ALIASES: [&str; 3] = ["数量", "销量", "quantity"];

/// 售出时间列别名
const SOLD_AT_ALIASES: [&str; 3] = ["售出时间", "时间", "sold_at"];

// ==========================================
// FieldMapper - 销售字段映射器
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    pub fn new() -> Self {
        Self
    }

    /// 从别名列表中取第一个非空值
    fn pick<'a>(row: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
        aliases
            .iter()
            .filter_map(|alias| row.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    /// 将原始行记录映射为 RawSalesRecord
    ///
    /// # 参数
    /// - `row`: 原始行记录
    /// - `row_number`: 数据行号 (从 1 开始,不含表头)
    ///
    /// # 返回
    /// - Ok(RawSalesRecord): 映射成功
    /// - Err(FieldMappingError): 产品引用或数量列缺失
    /// - Err(TypeConversionError): 数量或时间格式非法
    pub fn map_to_raw_sales(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawSalesRecord> {
        let product_ref = Self::pick(row, &PRODUCT_REF_ALIASES).ok_or_else(|| {
            ImportError::FieldMappingError {
                row: row_number,
                message: "产品引用列缺失 (产品ID/产品编号/产品名称)".to_string(),
            }
        })?;

        let quantity_raw =
            Self::pick(row, &QUANTITY_ALIASES).ok_or_else(|| ImportError::FieldMappingError {
                row: row_number,
                message: "数量列缺失 (数量/销量)".to_string(),
            })?;

        let quantity =
            quantity_raw
                .parse::<f64>()
                .map_err(|e| ImportError::TypeConversionError {
                    row: row_number,
                    field: "数量".to_string(),
                    message: format!("{}: {}", quantity_raw, e),
                })?;

        let sold_at = match Self::pick(row, &SOLD_AT_ALIASES) {
            Some(raw) => Some(Self::parse_sold_at(raw, row_number)?),
            None => None,
        };

        Ok(RawSalesRecord {
            product_ref: product_ref.to_string(),
            quantity,
            sold_at,
            row_number,
        })
    }

    /// 解析售出时间 (支持日期时间与纯日期两种格式)
    fn parse_sold_at(raw: &str, row_number: usize) -> ImportResult<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Ok(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
        Err(ImportError::TypeConversionError {
            row: row_number,
            field: "售出时间".to_string(),
            message: format!("期望 YYYY-MM-DD[ HH:MM:SS],实际 {}", raw),
        })
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}
