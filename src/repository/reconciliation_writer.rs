// ==========================================
// 订单导入服务 - 对账写入（先删后插）
// ==========================================
// 顺序: 查询是否存在 → 存在则删除明细+表头 → 插入表头 → 逐条插入明细
// 约束: 各语句依次执行，不包裹在同一事务内；
//       失败时 PersistenceError 记录停在哪个阶段
// ==========================================

use crate::repository::error::{PersistenceError, SaveStage};
use crate::repository::order_records::Persistable;
use crate::repository::record_store::RecordStore;

/// 保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// 是否替换了既有记录
    pub replaced: bool,
    pub detail_count: usize,
}

pub struct ReconciliationWriter;

impl ReconciliationWriter {
    /// 保存一个聚合
    ///
    /// # 参数
    /// - store: 记录存储
    /// - aggregate: 已完成解析与参照的聚合
    ///
    /// # 返回
    /// - Ok(SaveOutcome)
    /// - Err(PersistenceError): 含业务主键与失败阶段
    pub fn save<S, P>(store: &S, aggregate: &P) -> Result<SaveOutcome, PersistenceError>
    where
        S: RecordStore + ?Sized,
        P: Persistable + ?Sized,
    {
        let tables = aggregate.tables();
        let key = aggregate.key_value();
        let label = aggregate.key_label();

        let replaced = store
            .exists(tables, &key)
            .map_err(|e| PersistenceError::new(label.clone(), SaveStage::Lookup, e))?;

        if replaced {
            store
                .delete(tables, &key)
                .map_err(|e| PersistenceError::new(label.clone(), SaveStage::Delete, e))?;
        }

        store
            .insert(tables.header, &aggregate.header_record())
            .map_err(|e| PersistenceError::new(label.clone(), SaveStage::InsertHeader, e))?;

        let details = aggregate.detail_records();
        for (idx, detail) in details.iter().enumerate() {
            store
                .insert(tables.detail, detail)
                .map_err(|e| PersistenceError::new(label.clone(), SaveStage::InsertDetail(idx), e))?;
        }

        Ok(SaveOutcome {
            replaced,
            detail_count: details.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::OrderAggregate;
    use crate::domain::partner_b::{PartnerBOrder, PartnerBOrderLine};
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use crate::repository::record_store::{OrderTables, RecordRow};
    use rusqlite::types::Value;
    use std::sync::Mutex;

    /// 记录调用顺序，可在第 n 次插入时失败
    #[derive(Default)]
    struct ScriptedStore {
        existing: bool,
        fail_on_insert: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordStore for ScriptedStore {
        fn exists(&self, _tables: &OrderTables, _key: &Value) -> RepositoryResult<bool> {
            self.calls.lock().unwrap().push("exists".into());
            Ok(self.existing)
        }

        fn delete(&self, tables: &OrderTables, _key: &Value) -> RepositoryResult<()> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("delete {}", tables.detail));
            calls.push(format!("delete {}", tables.header));
            Ok(())
        }

        fn delete_by_key_prefix(&self, _tables: &OrderTables, _prefix: &str) -> RepositoryResult<usize> {
            Ok(0)
        }

        fn insert(&self, table: &'static str, _record: &RecordRow) -> RepositoryResult<()> {
            let mut calls = self.calls.lock().unwrap();
            let inserts = calls.iter().filter(|c| c.starts_with("insert")).count();
            if self.fail_on_insert == Some(inserts) {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".into()));
            }
            calls.push(format!("insert {}", table));
            Ok(())
        }
    }

    fn order_with_lines(n: usize) -> PartnerBOrder {
        let mut order = PartnerBOrder::new("PO-9".into(), String::new(), "SO-1".into(), 0);
        for i in 0..n {
            order.add_line(PartnerBOrderLine {
                line_number: i as i64 + 1,
                item_number: format!("ITEM-{}", i),
                item_cost: 1.0,
                quantity: 1,
                need_by_date: String::new(),
                catalog_unit_cost: 1.0,
                catalog_id: 1,
            });
        }
        order
    }

    #[test]
    fn test_existing_record_deleted_before_insert() {
        let store = ScriptedStore {
            existing: true,
            ..Default::default()
        };
        let outcome = ReconciliationWriter::save(&store, &order_with_lines(2)).unwrap();

        assert!(outcome.replaced);
        assert_eq!(outcome.detail_count, 2);
        let calls = store.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "exists",
                "delete partner_b_order_details",
                "delete partner_b_orders",
                "insert partner_b_orders",
                "insert partner_b_order_details",
                "insert partner_b_order_details",
            ]
        );
    }

    #[test]
    fn test_failure_reports_stage() {
        let store = ScriptedStore {
            fail_on_insert: Some(2),
            ..Default::default()
        };
        let err = ReconciliationWriter::save(&store, &order_with_lines(3)).unwrap_err();

        assert_eq!(err.key, "PO-9");
        assert_eq!(err.stage, SaveStage::InsertDetail(1));
        assert!(err.leaves_partial_state());
    }
}
