// ==========================================
// 订单导入服务 - 伙伴 C 销售发票模型
// ==========================================
// 主键: 整数 PO 号（源单元格为文本）
// 表头: 状态 / 路线代码 / 版本 / 需求日期
// 红线: 表头或明细为 CANCELLED 时，该明细数量与单价强制归零
// ==========================================

use crate::domain::aggregate::OrderAggregate;
use crate::domain::types::{costs_differ, Discrepancy, OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCInvoiceLine {
    pub item_number: String,
    pub line_number: String,
    pub status: OrderStatus,
    pub quantity: i64,
    pub unit_cost: f64,
    pub catalog_unit_cost: f64,
    pub catalog_id: i64,
}

impl PartnerCInvoiceLine {
    /// 数量与两个单价归零（目录标识保留）
    pub fn zero_out(&mut self) {
        self.quantity = 0;
        self.unit_cost = 0.0;
        self.catalog_unit_cost = 0.0;
    }

    pub fn extended_cost(&self) -> f64 {
        self.quantity as f64 * self.unit_cost
    }

    pub fn extended_catalog_cost(&self) -> f64 {
        self.quantity as f64 * self.catalog_unit_cost
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCInvoice {
    pub po_number: i64,
    pub sales_order_number: String,
    pub status: OrderStatus,
    pub revision: i32,
    pub need_by_date: String,
    pub route_code: String,
    pub total_cost: f64,
    pub total_catalog_cost: f64,
    pub lines: Vec<PartnerCInvoiceLine>,
}

impl PartnerCInvoice {
    pub fn new(
        po_number: i64,
        sales_order_number: String,
        status: OrderStatus,
        revision: i32,
        need_by_date: String,
        route_code: String,
    ) -> Self {
        Self {
            po_number,
            sales_order_number,
            status,
            revision,
            need_by_date,
            route_code,
            total_cost: 0.0,
            total_catalog_cost: 0.0,
            lines: Vec::new(),
        }
    }

    /// 该明细是否处于取消状态（表头或自身）
    pub fn is_line_cancelled(&self, line: &PartnerCInvoiceLine) -> bool {
        self.status.is_cancelled() || line.status.is_cancelled()
    }

    /// 按当前明细重新计算两个合计
    ///
    /// 替换展开会改写原明细数量并追加派生明细，展开后需重新计算
    pub fn recalculate_totals(&mut self) {
        self.total_cost = self.lines.iter().map(|l| l.extended_cost()).sum();
        self.total_catalog_cost = self.lines.iter().map(|l| l.extended_catalog_cost()).sum();
    }
}

impl OrderAggregate for PartnerCInvoice {
    type Key = i64;
    type Line = PartnerCInvoiceLine;

    fn key(&self) -> &i64 {
        &self.po_number
    }

    fn lines(&self) -> &[PartnerCInvoiceLine] {
        &self.lines
    }

    fn add_line(&mut self, mut line: PartnerCInvoiceLine) {
        if self.is_line_cancelled(&line) {
            line.zero_out();
        }
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

    /// 取消的明细不记录价格差异
    fn discrepancies(&self) -> Vec<Discrepancy> {
        self.lines
            .iter()
            .filter(|line| !self.is_line_cancelled(line))
            .filter(|line| costs_differ(line.unit_cost, line.catalog_unit_cost))
            .map(|line| Discrepancy::CostMismatch {
                order_key: self.po_number.to_string(),
                item_number: line.item_number.clone(),
                stated: line.unit_cost,
                catalog: line.catalog_unit_cost,
            })
            .collect()
    }
}
