// ==========================================
// 订单导入服务 - 核心库
// ==========================================
// 职责: 监控投递目录，把三种伙伴格式的电子表格订单/发票
//       解析、参照零件目录后按业务主键先删后插写入数据库
// 技术栈: calamine + rusqlite + tokio + notify
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 订单/发票聚合与替换规则
pub mod domain;

// 数据仓储层 - 零件目录与订单记录
pub mod repository;

// 导入层 - 解码与解析
pub mod importer;

// 配置层 - 目录与运行参数
pub mod config;

// 分派层 - 目录监控与单文件处理
pub mod dispatch;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{ImporterSettings, ProcessingConfig};
pub use dispatch::{DropFolderDispatcher, HandlerRegistry, PartnerFormat};
pub use domain::{PartnerAOrder, PartnerBOrder, PartnerCInvoice, SubstitutionRule};
pub use importer::{ImportError, ImportResult};
pub use repository::{SqliteStoreProvider, StoreProvider};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单导入服务";
