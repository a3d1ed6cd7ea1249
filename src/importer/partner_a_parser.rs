// ==========================================
// 订单导入服务 - 伙伴 A 采购订单解析
// ==========================================
// 表头行判定: 订单号列为文本（数据行为数值）
// 料号: 去除首尾空白后去掉固定 8 位前缀
// ==========================================

use crate::domain::partner_a::{PartnerAOrder, PartnerAOrderLine};
use crate::importer::cell::{CellValue, SheetRow};
use crate::importer::enrichment::ReferenceEnricher;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_format::RowFormat;

// 列序号
const ORDER_NUMBER: usize = 0;
const LINE_NUMBER: usize = 1;
const ITEM_NUMBER: usize = 2;
const QUANTITY: usize = 8;
const NEED_BY_DATE: usize = 12;
const UNIT_PRICE: usize = 17;
const COST_PER: usize = 18;
const IMPORT_DATE: usize = 36;

/// 料号固定前缀长度
pub const ITEM_PREFIX_LEN: usize = 8;

pub struct PartnerAFormat;

impl PartnerAFormat {
    fn strip_item_prefix(row: &SheetRow) -> ImportResult<String> {
        let raw = row.text(ITEM_NUMBER);
        if raw.chars().count() < ITEM_PREFIX_LEN {
            return Err(ImportError::ItemNumberFormat {
                row: row.row_number,
                value: raw,
            });
        }
        Ok(raw.chars().skip(ITEM_PREFIX_LEN).collect::<String>().trim().to_string())
    }
}

impl RowFormat for PartnerAFormat {
    type Aggregate = PartnerAOrder;

    const MIN_COLUMNS: usize = IMPORT_DATE + 1;

    fn is_header(&self, row: &SheetRow) -> bool {
        row.cell(ORDER_NUMBER).is_text()
    }

    fn business_key(&self, row: &SheetRow) -> ImportResult<i64> {
        match row.cell(ORDER_NUMBER) {
            CellValue::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
            CellValue::Empty => Err(ImportError::MissingValue {
                row: row.row_number,
                field: "order_number".to_string(),
            }),
            other => Err(ImportError::CellTypeError {
                row: row.row_number,
                field: "order_number".to_string(),
                message: format!("期望整数订单号，实际为 {:?}", other),
            }),
        }
    }

    fn new_aggregate(&self, key: i64, row: &SheetRow) -> ImportResult<PartnerAOrder> {
        Ok(PartnerAOrder::new(key, row.date_text(IMPORT_DATE)))
    }

    fn parse_line(
        &self,
        _aggregate: &PartnerAOrder,
        row: &SheetRow,
        enricher: &ReferenceEnricher<'_>,
    ) -> ImportResult<PartnerAOrderLine> {
        let item_number = Self::strip_item_prefix(row)?;
        let reference = enricher.lookup(&item_number)?;

        Ok(PartnerAOrderLine {
            item_number,
            line_number: row.require_integer(LINE_NUMBER, "line_number")?,
            quantity: row.require_number(QUANTITY, "quantity")?,
            unit_cost: row.require_number(UNIT_PRICE, "unit_price")?,
            cost_per: row.require_number(COST_PER, "cost_per")?,
            need_by_date: row.date_text(NEED_BY_DATE),
            catalog_unit_cost: reference.unit_cost,
            catalog_id: reference.identifier,
        })
    }
}
