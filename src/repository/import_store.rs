// ==========================================
// 订单导入服务 - 单文件存储会话
// ==========================================
// 每个文件打开一次，处理结束（成功或失败）即释放
// ==========================================

use crate::importer::error::ImportResult;
use crate::repository::record_store::RecordStore;
use crate::repository::reference_store::ReferenceStore;

/// 目录查询 + 记录读写
pub trait ImportStore: ReferenceStore + RecordStore {
    fn as_reference(&self) -> &dyn ReferenceStore;
    fn as_records(&self) -> &dyn RecordStore;
}

impl<T: ReferenceStore + RecordStore> ImportStore for T {
    fn as_reference(&self) -> &dyn ReferenceStore {
        self
    }

    fn as_records(&self) -> &dyn RecordStore {
        self
    }
}

/// 按文件打开存储会话
pub trait StoreProvider: Send + Sync {
    fn open(&self) -> ImportResult<Box<dyn ImportStore>>;
}
