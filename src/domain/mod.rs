// ==========================================
// 订单导入服务 - 领域层
// ==========================================
// 职责: 三种伙伴格式的 表头+明细 聚合、替换规则、参照结果
// 生命周期: 每个文件每个业务主键构建一次，落库后丢弃
// ==========================================

pub mod aggregate;
pub mod partner_a;
pub mod partner_b;
pub mod partner_c;
pub mod substitution;
pub mod types;

// 重导出核心类型
pub use aggregate::OrderAggregate;
pub use partner_a::{PartnerAOrder, PartnerAOrderLine};
pub use partner_b::{PartnerBOrder, PartnerBOrderLine};
pub use partner_c::{PartnerCInvoice, PartnerCInvoiceLine};
pub use substitution::{DerivedItem, SubstitutionRule};
pub use types::{Discrepancy, OrderStatus, PartReference};
