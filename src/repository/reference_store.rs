// ==========================================
// 订单导入服务 - 零件目录参照接口
// ==========================================
// 目录表 part_numbers 为每个伙伴格式维护一组列:
//   <format>_part_number / <format>_catalog_id / <format>_price
// 未找到时标识与单价均返回 0
// ==========================================

use crate::repository::error::RepositoryResult;

/// 目录表名
pub const CATALOG_TABLE: &str = "part_numbers";

/// 某一伙伴格式在目录表中的列组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogColumns {
    pub part_column: &'static str,
    pub id_column: &'static str,
    pub cost_column: &'static str,
}

pub const PARTNER_A_CATALOG: CatalogColumns = CatalogColumns {
    part_column: "partner_a_part_number",
    id_column: "partner_a_catalog_id",
    cost_column: "partner_a_price",
};

pub const PARTNER_B_CATALOG: CatalogColumns = CatalogColumns {
    part_column: "partner_b_part_number",
    id_column: "partner_b_catalog_id",
    cost_column: "partner_b_price",
};

pub const PARTNER_C_CATALOG: CatalogColumns = CatalogColumns {
    part_column: "partner_c_part_number",
    id_column: "partner_c_catalog_id",
    cost_column: "partner_c_price",
};

/// 零件目录查询
pub trait ReferenceStore {
    /// 目录标识（0 = 未找到）
    fn part_identifier(&self, columns: &CatalogColumns, item_number: &str) -> RepositoryResult<i64>;

    /// 目录单价（0 = 未找到）
    fn part_unit_cost(&self, columns: &CatalogColumns, item_number: &str) -> RepositoryResult<f64>;
}
