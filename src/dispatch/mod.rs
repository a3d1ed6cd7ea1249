// ==========================================
// 订单导入服务 - 投递目录分派层
// ==========================================
// 职责: 目录监控、单文件串行处理、文件归档
// 约束: 全系统同一时刻只处理一个文件
// ==========================================

pub mod file_mover;
pub mod handler;
pub mod watcher;

// 重导出核心类型
pub use file_mover::relocate;
pub use handler::{
    DropHandler, FileReport, HandlerRegistry, PartnerAHandler, PartnerAMode, PartnerBHandler,
    PartnerCHandler, PartnerFormat,
};
pub use watcher::{DispatchError, DropFolderDispatcher, DropSource, FileOutcome};
