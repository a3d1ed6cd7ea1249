// ==========================================
// 订单导入服务 - 伙伴 B 采购订单解析
// ==========================================
// 表头行判定: 首列文本为 "PO"（不区分大小写）
// 订单日期同时作为表头日期与明细需求日期
// ==========================================

use crate::domain::partner_b::{PartnerBOrder, PartnerBOrderLine};
use crate::importer::cell::SheetRow;
use crate::importer::enrichment::ReferenceEnricher;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_format::RowFormat;

const PO_NUMBER: usize = 0;
const ORDER_DATE: usize = 1;
const LINE_NUMBER: usize = 2;
const ITEM_NUMBER: usize = 3;
const ITEM_COST: usize = 5;
const SALES_ORDER_NUMBER: usize = 6;
const QUANTITY: usize = 8;
const REVISION: usize = 37;

const HEADER_LABEL: &str = "PO";

pub struct PartnerBFormat;

impl PartnerBFormat {
    /// 版本列为数字文本，空值视为 0
    fn parse_revision(row: &SheetRow) -> ImportResult<i32> {
        let raw = row.text(REVISION);
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i32)
            .ok_or_else(|| ImportError::CellTypeError {
                row: row.row_number,
                field: "revision".to_string(),
                message: format!("版本号不是整数: {}", raw),
            })
    }
}

impl RowFormat for PartnerBFormat {
    type Aggregate = PartnerBOrder;

    const MIN_COLUMNS: usize = REVISION + 1;

    fn is_header(&self, row: &SheetRow) -> bool {
        row.text(PO_NUMBER).to_uppercase() == HEADER_LABEL
    }

    fn business_key(&self, row: &SheetRow) -> ImportResult<String> {
        row.require_text(PO_NUMBER, "po_number")
    }

    fn new_aggregate(&self, key: String, row: &SheetRow) -> ImportResult<PartnerBOrder> {
        Ok(PartnerBOrder::new(
            key,
            row.date_text(ORDER_DATE),
            row.text(SALES_ORDER_NUMBER),
            Self::parse_revision(row)?,
        ))
    }

    fn parse_line(
        &self,
        _aggregate: &PartnerBOrder,
        row: &SheetRow,
        enricher: &ReferenceEnricher<'_>,
    ) -> ImportResult<PartnerBOrderLine> {
        let item_number = row.text(ITEM_NUMBER);
        let reference = enricher.lookup(&item_number)?;

        Ok(PartnerBOrderLine {
            line_number: row.require_integer(LINE_NUMBER, "line_number")?,
            item_number,
            item_cost: row.require_number(ITEM_COST, "item_cost")?,
            quantity: row.require_integer(QUANTITY, "quantity")?,
            need_by_date: row.date_text(ORDER_DATE),
            catalog_unit_cost: reference.unit_cost,
            catalog_id: reference.identifier,
        })
    }
}
