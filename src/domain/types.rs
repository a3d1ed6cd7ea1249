// ==========================================
// 订单导入服务 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单价比较容差（小于该差值视为一致）
pub const COST_TOLERANCE: f64 = 1e-6;

/// 判断两个单价是否不一致
pub fn costs_differ(stated: f64, catalog: f64) -> bool {
    (stated - catalog).abs() > COST_TOLERANCE
}

// ==========================================
// 订单/行状态 (Order Status)
// ==========================================
// 源数据为自由文本，统一 TRIM + UPPER 后判定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn from_raw(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "OPEN" => OrderStatus::Open,
            "CANCELLED" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Open)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// PartReference - 零件目录参照结果
// ==========================================
// 未找到时 identifier = 0, unit_cost = 0
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartReference {
    pub identifier: i64,
    pub unit_cost: f64,
}

impl PartReference {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.identifier > 0
    }

    /// 标识与单价均有效（替换展开的准入条件）
    pub fn is_resolvable(&self) -> bool {
        self.identifier > 0 && self.unit_cost > 0.0
    }
}

// ==========================================
// Discrepancy - 价格差异（仅记录，不阻断落库）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Discrepancy {
    /// 订单单价与目录单价不一致
    CostMismatch {
        order_key: String,
        item_number: String,
        stated: f64,
        catalog: f64,
    },
    /// 料号在目录中不存在
    MissingFromCatalog {
        order_key: String,
        item_number: String,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::CostMismatch {
                order_key,
                item_number,
                stated,
                catalog,
            } => write!(
                f,
                "料号 {} 在订单 {} 上的单价为 {}，目录单价为 {}",
                item_number, order_key, stated, catalog
            ),
            Discrepancy::MissingFromCatalog {
                order_key,
                item_number,
            } => write!(f, "订单 {} 上的料号 {} 在零件目录中不存在", order_key, item_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_raw() {
        assert_eq!(OrderStatus::from_raw(" open "), OrderStatus::Open);
        assert_eq!(OrderStatus::from_raw("Cancelled"), OrderStatus::Cancelled);
        assert_eq!(
            OrderStatus::from_raw("closed"),
            OrderStatus::Other("CLOSED".to_string())
        );
        assert_eq!(OrderStatus::from_raw("closed").as_str(), "CLOSED");
    }

    #[test]
    fn test_costs_differ() {
        assert!(!costs_differ(1.25, 1.25));
        assert!(!costs_differ(0.1 + 0.2, 0.3));
        assert!(costs_differ(1.25, 1.26));
    }

    #[test]
    fn test_part_reference_resolvable() {
        assert!(!PartReference::not_found().is_found());
        let zero_cost = PartReference {
            identifier: 7,
            unit_cost: 0.0,
        };
        assert!(zero_cost.is_found());
        assert!(!zero_cost.is_resolvable());
    }
}
