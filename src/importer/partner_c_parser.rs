// ==========================================
// 订单导入服务 - 伙伴 C 销售发票解析
// ==========================================
// 表头行判定: 首列文本为 "supplier name"（不区分大小写）
// 主键: PO 号列为文本，解析为整数
// 取消: 表头或明细为 CANCELLED 时不查询目录，数量/单价归零
// 料号: 截断到第一个 '*' 之前
// ==========================================

use crate::domain::partner_c::{PartnerCInvoice, PartnerCInvoiceLine};
use crate::domain::types::OrderStatus;
use crate::importer::cell::SheetRow;
use crate::importer::enrichment::ReferenceEnricher;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_format::RowFormat;

const SUPPLIER: usize = 0;
const PURCHASE_ORDER: usize = 1;
const REVISION: usize = 3;
const ORDER_NUMBER: usize = 6;
const HEADER_STATUS: usize = 8;
const LINE_NUMBER: usize = 10;
const QUANTITY: usize = 11;
const UNIT_PRICE: usize = 14;
const ITEM_STATUS: usize = 16;
const ITEM_NUMBER: usize = 17;
const ROUTE_CODE: usize = 19;
const NEED_BY_DATE: usize = 20;

const HEADER_LABEL: &str = "supplier name";

/// 料号中的附加标记分隔符
pub const ITEM_MARKER: char = '*';

/// 截断到第一个标记之前
pub fn trim_item_marker(raw: &str) -> String {
    match raw.find(ITEM_MARKER) {
        Some(pos) => raw[..pos].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

pub struct PartnerCFormat;

impl RowFormat for PartnerCFormat {
    type Aggregate = PartnerCInvoice;

    const MIN_COLUMNS: usize = NEED_BY_DATE + 1;

    fn is_header(&self, row: &SheetRow) -> bool {
        row.text(SUPPLIER).to_lowercase() == HEADER_LABEL
    }

    fn business_key(&self, row: &SheetRow) -> ImportResult<i64> {
        let raw = row.require_text(PURCHASE_ORDER, "purchase_order")?;
        raw.parse::<i64>().map_err(|_| ImportError::CellTypeError {
            row: row.row_number,
            field: "purchase_order".to_string(),
            message: format!("PO 号不是整数: {}", raw),
        })
    }

    fn new_aggregate(&self, key: i64, row: &SheetRow) -> ImportResult<PartnerCInvoice> {
        Ok(PartnerCInvoice::new(
            key,
            row.text(ORDER_NUMBER),
            OrderStatus::from_raw(&row.text(HEADER_STATUS)),
            row.integer(REVISION) as i32,
            row.date_text(NEED_BY_DATE),
            row.text(ROUTE_CODE),
        ))
    }

    fn parse_line(
        &self,
        aggregate: &PartnerCInvoice,
        row: &SheetRow,
        enricher: &ReferenceEnricher<'_>,
    ) -> ImportResult<PartnerCInvoiceLine> {
        let mut line = PartnerCInvoiceLine {
            item_number: trim_item_marker(&row.text(ITEM_NUMBER)),
            line_number: row.text(LINE_NUMBER),
            status: OrderStatus::from_raw(&row.text(ITEM_STATUS)),
            quantity: row.require_integer(QUANTITY, "quantity")?,
            unit_cost: row.require_number(UNIT_PRICE, "unit_price")?,
            catalog_unit_cost: 0.0,
            catalog_id: 0,
        };

        if aggregate.is_line_cancelled(&line) {
            line.zero_out();
            return Ok(line);
        }

        let reference = enricher.lookup(&line.item_number)?;
        line.catalog_unit_cost = reference.unit_cost;
        line.catalog_id = reference.identifier;
        Ok(line)
    }
}
