// ==========================================
// 订单导入服务 - 聚合到表记录的映射
// ==========================================
// 每种聚合映射为: 一行表头 + 每条明细一行
// ==========================================

use crate::domain::partner_a::PartnerAOrder;
use crate::domain::partner_b::PartnerBOrder;
use crate::domain::partner_c::PartnerCInvoice;
use crate::repository::record_store::{
    OrderTables, RecordRow, PARTNER_A_TABLES, PARTNER_B_TABLES, PARTNER_C_TABLES,
};
use chrono::Local;
use rusqlite::types::Value;

/// 可落库的聚合
pub trait Persistable {
    fn tables(&self) -> &'static OrderTables;

    /// 业务主键的数据库值
    fn key_value(&self) -> Value;

    /// 业务主键（日志用）
    fn key_label(&self) -> String;

    fn header_record(&self) -> RecordRow;

    fn detail_records(&self) -> Vec<RecordRow>;
}

impl Persistable for PartnerAOrder {
    fn tables(&self) -> &'static OrderTables {
        &PARTNER_A_TABLES
    }

    fn key_value(&self) -> Value {
        Value::Integer(self.po_number)
    }

    fn key_label(&self) -> String {
        self.po_number.to_string()
    }

    fn header_record(&self) -> RecordRow {
        RecordRow::new()
            .with("po_number", self.po_number)
            .with("po_date", self.import_date.clone())
            .with("revision", self.revision)
            .with("total_cost", self.total_cost)
            .with("total_catalog_cost", self.total_catalog_cost)
    }

    fn detail_records(&self) -> Vec<RecordRow> {
        self.lines
            .iter()
            .map(|line| {
                RecordRow::new()
                    .with("po_number", self.po_number)
                    .with("line_number", line.line_number)
                    .with("part_number", line.item_number.clone())
                    .with("quantity_ordered", line.quantity)
                    .with("catalog_id", line.catalog_id)
                    .with("po_price", line.unit_price())
                    .with("due_by_date", line.need_by_date.clone())
            })
            .collect()
    }
}

impl Persistable for PartnerBOrder {
    fn tables(&self) -> &'static OrderTables {
        &PARTNER_B_TABLES
    }

    fn key_value(&self) -> Value {
        Value::Text(self.po_number.clone())
    }

    fn key_label(&self) -> String {
        self.po_number.clone()
    }

    fn header_record(&self) -> RecordRow {
        RecordRow::new()
            .with("po_number", self.po_number.clone())
            .with("po_date", self.po_date.clone())
            .with("sales_order_number", self.sales_order_number.clone())
            .with("revision", self.revision)
            .with("total_cost", self.total_cost)
            .with("total_catalog_cost", self.total_catalog_cost)
    }

    fn detail_records(&self) -> Vec<RecordRow> {
        self.lines
            .iter()
            .map(|line| {
                RecordRow::new()
                    .with("po_number", self.po_number.clone())
                    .with("line_number", line.line_number)
                    .with("part_number", line.item_number.clone())
                    .with("quantity_ordered", line.quantity)
                    .with("catalog_id", line.catalog_id)
                    .with("po_price", line.item_cost)
                    .with("due_by_date", line.need_by_date.clone())
            })
            .collect()
    }
}

impl Persistable for PartnerCInvoice {
    fn tables(&self) -> &'static OrderTables {
        &PARTNER_C_TABLES
    }

    fn key_value(&self) -> Value {
        Value::Integer(self.po_number)
    }

    fn key_label(&self) -> String {
        self.po_number.to_string()
    }

    fn header_record(&self) -> RecordRow {
        let date_entered = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        RecordRow::new()
            .with("po_number", self.po_number)
            .with("sales_order_number", self.sales_order_number.clone())
            .with("revision", self.revision)
            .with("status", self.status.as_str().to_string())
            .with("total_order_dollars", self.total_cost)
            .with("total_catalog_cost", self.total_catalog_cost)
            .with("date_entered", date_entered)
            .with("due_by_date", self.need_by_date.clone())
            .with("route_code", self.route_code.clone())
    }

    fn detail_records(&self) -> Vec<RecordRow> {
        self.lines
            .iter()
            .map(|line| {
                RecordRow::new()
                    .with("po_number", self.po_number)
                    .with("line_number", line.line_number.clone())
                    .with("part_number", line.item_number.clone())
                    .with("status", line.status.as_str().to_string())
                    .with("quantity_ordered", line.quantity)
                    .with("unit_price", line.unit_cost)
                    .with("catalog_id", line.catalog_id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::OrderAggregate;
    use crate::domain::partner_a::PartnerAOrderLine;

    #[test]
    fn test_partner_a_detail_uses_normalized_price() {
        let mut order = PartnerAOrder::new(100, "2026-10-16".to_string());
        order.add_line(PartnerAOrderLine {
            item_number: "AB-100".to_string(),
            line_number: 1,
            quantity: 10.0,
            unit_cost: 250.0,
            cost_per: 100.0,
            need_by_date: "2026-11-01".to_string(),
            catalog_unit_cost: 2.5,
            catalog_id: 11,
        });

        let details = order.detail_records();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].get("po_price"), Some(&Value::Real(2.5)));
        assert_eq!(order.key_value(), Value::Integer(100));
        assert_eq!(
            order.header_record().get("po_date"),
            Some(&Value::Text("2026-10-16".to_string()))
        );
    }
}
