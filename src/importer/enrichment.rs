// ==========================================
// 订单导入服务 - 零件目录参照
// ==========================================
// 每条明细解析后立即查询目录标识与目录单价
// 价格差异只写入 pricing 日志，不阻断落库
// ==========================================

use crate::domain::aggregate::OrderAggregate;
use crate::domain::types::PartReference;
use crate::importer::error::ImportResult;
use crate::repository::reference_store::{CatalogColumns, ReferenceStore};
use tracing::warn;

pub struct ReferenceEnricher<'a> {
    store: &'a dyn ReferenceStore,
    columns: CatalogColumns,
}

impl<'a> ReferenceEnricher<'a> {
    pub fn new(store: &'a dyn ReferenceStore, columns: CatalogColumns) -> Self {
        Self { store, columns }
    }

    /// 查询料号的目录标识与单价
    ///
    /// 空料号不查询，直接返回未找到
    pub fn lookup(&self, item_number: &str) -> ImportResult<PartReference> {
        let item_number = item_number.trim();
        if item_number.is_empty() {
            return Ok(PartReference::not_found());
        }

        let identifier = self.store.part_identifier(&self.columns, item_number)?;
        let unit_cost = self.store.part_unit_cost(&self.columns, item_number)?;
        Ok(PartReference {
            identifier,
            unit_cost,
        })
    }
}

/// 把聚合的价格差异写入 pricing 日志
pub fn log_discrepancies<A: OrderAggregate>(aggregate: &A) -> usize {
    let found = aggregate.discrepancies();
    for discrepancy in &found {
        warn!(target: "pricing", "{}", discrepancy);
    }
    found.len()
}
