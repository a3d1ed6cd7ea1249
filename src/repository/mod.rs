// ==========================================
// 订单导入服务 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 零件目录查询、订单表头/明细的删除与插入
// 约束: 所有值参数化传入
// ==========================================

pub mod error;
pub mod import_store;
pub mod order_records;
pub mod reconciliation_writer;
pub mod record_store;
pub mod reference_store;
pub mod sqlite_store;

// 重导出核心类型
pub use error::{PersistenceError, RepositoryError, RepositoryResult, SaveStage};
pub use import_store::{ImportStore, StoreProvider};
pub use order_records::Persistable;
pub use reconciliation_writer::{ReconciliationWriter, SaveOutcome};
pub use record_store::{OrderTables, RecordRow, RecordStore};
pub use reference_store::{CatalogColumns, ReferenceStore};
pub use sqlite_store::{SqliteStore, SqliteStoreProvider};
