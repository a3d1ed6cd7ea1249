// ==========================================
// 订单导入服务 - 伙伴 A 采购订单模型
// ==========================================
// 来源: 预测订单（主目录）/ 确认订单（副目录）
// 主键: 数值型 PO 号
// 单价: 源单价 ÷ 计价单位(cost-per)
// ==========================================

use crate::domain::aggregate::OrderAggregate;
use crate::domain::types::{costs_differ, Discrepancy};
use serde::{Deserialize, Serialize};

/// 预测订单的 PO 号前缀（重新导入预测前按此前缀清空）
pub const FORECAST_KEY_PREFIX: &str = "1";

// ==========================================
// PartnerAOrderLine - 订单明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerAOrderLine {
    pub item_number: String,        // 料号（已去除固定前缀）
    pub line_number: i64,           // 行号
    pub quantity: f64,              // 订货数量
    pub unit_cost: f64,             // 源单价（未按计价单位折算）
    pub cost_per: f64,              // 计价单位
    pub need_by_date: String,       // 需求日期
    pub catalog_unit_cost: f64,     // 目录单价
    pub catalog_id: i64,            // 目录标识（0 = 未找到）
}

impl PartnerAOrderLine {
    /// 折算后的单价
    ///
    /// 计价单位为 0 或负数时按 1 处理
    pub fn unit_price(&self) -> f64 {
        if self.cost_per > 0.0 {
            self.unit_cost / self.cost_per
        } else {
            self.unit_cost
        }
    }

    pub fn extended_cost(&self) -> f64 {
        self.quantity * self.unit_price()
    }

    pub fn extended_catalog_cost(&self) -> f64 {
        self.quantity * self.catalog_unit_cost
    }
}

// ==========================================
// PartnerAOrder - 订单表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerAOrder {
    pub po_number: i64,
    pub revision: i32,
    pub import_date: String,
    pub total_cost: f64,
    pub total_catalog_cost: f64,
    pub lines: Vec<PartnerAOrderLine>,
}

impl PartnerAOrder {
    pub fn new(po_number: i64, import_date: String) -> Self {
        Self {
            po_number,
            revision: 0,
            import_date,
            total_cost: 0.0,
            total_catalog_cost: 0.0,
            lines: Vec::new(),
        }
    }

    /// 是否为预测订单（PO 号以 1 开头）
    pub fn is_forecast(&self) -> bool {
        self.po_number.to_string().starts_with(FORECAST_KEY_PREFIX)
    }
}

impl OrderAggregate for PartnerAOrder {
    type Key = i64;
    type Line = PartnerAOrderLine;

    fn key(&self) -> &i64 {
        &self.po_number
    }

    fn lines(&self) -> &[PartnerAOrderLine] {
        &self.lines
    }

    fn add_line(&mut self, line: PartnerAOrderLine) {
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

    fn discrepancies(&self) -> Vec<Discrepancy> {
        self.lines
            .iter()
            .filter(|line| costs_differ(line.unit_price(), line.catalog_unit_cost))
            .map(|line| Discrepancy::CostMismatch {
                order_key: self.po_number.to_string(),
                item_number: line.item_number.clone(),
                stated: line.unit_price(),
                catalog: line.catalog_unit_cost,
            })
            .collect()
    }
}
