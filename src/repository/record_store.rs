// ==========================================
// 订单导入服务 - 订单记录存储接口
// ==========================================
// 每个伙伴格式两张表: 表头 + 明细，明细通过业务主键引用表头
// 删除固定两步: 先明细后表头
// 约束: 表名/列名均为编译期常量，值全部参数化
// ==========================================

use crate::repository::error::RepositoryResult;
use rusqlite::types::Value;

/// 一组 表头/明细 表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTables {
    pub header: &'static str,
    pub detail: &'static str,
    pub key_column: &'static str,
}

pub const PARTNER_A_TABLES: OrderTables = OrderTables {
    header: "partner_a_orders",
    detail: "partner_a_order_details",
    key_column: "po_number",
};

pub const PARTNER_B_TABLES: OrderTables = OrderTables {
    header: "partner_b_orders",
    detail: "partner_b_order_details",
    key_column: "po_number",
};

pub const PARTNER_C_TABLES: OrderTables = OrderTables {
    header: "partner_c_orders",
    detail: "partner_c_order_details",
    key_column: "po_number",
};

// ==========================================
// RecordRow - 待插入的一行（列名 + 值）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordRow {
    pub columns: Vec<(&'static str, Value)>,
}

impl RecordRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.columns.push((column, value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

/// 订单记录读写
pub trait RecordStore {
    /// 表头中是否已存在该业务主键
    fn exists(&self, tables: &OrderTables, key: &Value) -> RepositoryResult<bool>;

    /// 删除该业务主键的全部明细，再删除表头
    fn delete(&self, tables: &OrderTables, key: &Value) -> RepositoryResult<()>;

    /// 删除业务主键以 prefix 开头的全部订单（先明细后表头）
    ///
    /// # 返回
    /// - 删除的表头行数
    fn delete_by_key_prefix(&self, tables: &OrderTables, prefix: &str) -> RepositoryResult<usize>;

    fn insert(&self, table: &'static str, record: &RecordRow) -> RepositoryResult<()>;
}
