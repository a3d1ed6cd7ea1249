// ==========================================
// 订单导入服务 - 聚合公共接口
// ==========================================
// 职责: 三种格式的 表头+明细 聚合共享的最小接口
// 约束: 每条明细加入时同步累加 金额合计 / 目录金额合计
// ==========================================

use crate::domain::types::Discrepancy;
use std::fmt;

/// 订单/发票聚合
pub trait OrderAggregate {
    /// 业务主键（PO 号 / 订单号）
    type Key: PartialEq + Clone + fmt::Display;
    /// 明细行
    type Line;

    fn key(&self) -> &Self::Key;

    fn lines(&self) -> &[Self::Line];

    /// 追加明细并累加合计
    fn add_line(&mut self, line: Self::Line);

    /// 订单金额合计 Σ(数量 × 单价)
    fn total_cost(&self) -> f64;

    /// 目录金额合计 Σ(数量 × 目录单价)
    fn total_catalog_cost(&self) -> f64;

    /// 价格差异（仅用于日志）
    fn discrepancies(&self) -> Vec<Discrepancy>;

    fn line_count(&self) -> usize {
        self.lines().len()
    }
}
