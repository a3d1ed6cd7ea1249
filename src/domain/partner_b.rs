// ==========================================
// 订单导入服务 - 伙伴 B 采购订单模型
// ==========================================
// 主键: 字符串 PO 号
// 表头: 销售订单号 + 版本号
// 无取消概念
// ==========================================

use crate::domain::aggregate::OrderAggregate;
use crate::domain::types::{costs_differ, Discrepancy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerBOrderLine {
    pub line_number: i64,
    pub item_number: String,
    pub item_cost: f64,
    pub quantity: i64,
    pub need_by_date: String,
    pub catalog_unit_cost: f64,
    pub catalog_id: i64,
}

impl PartnerBOrderLine {
    pub fn extended_cost(&self) -> f64 {
        self.quantity as f64 * self.item_cost
    }

    pub fn extended_catalog_cost(&self) -> f64 {
        self.quantity as f64 * self.catalog_unit_cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerBOrder {
    pub po_number: String,
    pub po_date: String,
    pub sales_order_number: String,
    pub revision: i32,
    pub total_cost: f64,
    pub total_catalog_cost: f64,
    pub lines: Vec<PartnerBOrderLine>,
}

impl PartnerBOrder {
    pub fn new(po_number: String, po_date: String, sales_order_number: String, revision: i32) -> Self {
        Self {
            po_number,
            po_date,
            sales_order_number,
            revision,
            total_cost: 0.0,
            total_catalog_cost: 0.0,
            lines: Vec::new(),
        }
    }
}

impl OrderAggregate for PartnerBOrder {
    type Key = String;
    type Line = PartnerBOrderLine;

    fn key(&self) -> &String {
        &self.po_number
    }

    fn lines(&self) -> &[PartnerBOrderLine] {
        &self.lines
    }

    fn add_line(&mut self, line: PartnerBOrderLine) {
        self.total_cost += line.extended_cost();
        self.total_catalog_cost += line.extended_catalog_cost();
        self.lines.push(line);
    }

    fn total_cost(&self) -> f64 {
        self.total_cost
    }

    fn total_catalog_cost(&self) -> f64 {
        self.total_catalog_cost
    }

    /// 目录中不存在的料号单独记录，不再比较单价
    fn discrepancies(&self) -> Vec<Discrepancy> {
        self.lines
            .iter()
            .filter_map(|line| {
                if line.catalog_id <= 0 {
                    Some(Discrepancy::MissingFromCatalog {
                        order_key: self.po_number.clone(),
                        item_number: line.item_number.clone(),
                    })
                } else if costs_differ(line.item_cost, line.catalog_unit_cost) {
                    Some(Discrepancy::CostMismatch {
                        order_key: self.po_number.clone(),
                        item_number: line.item_number.clone(),
                        stated: line.item_cost,
                        catalog: line.catalog_unit_cost,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
