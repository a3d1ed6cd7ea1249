// ==========================================
// 订单导入服务 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use std::fmt;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ==========================================
// SaveStage - 对账写入阶段
// ==========================================
// 删除与插入不在同一事务内，出错时记录停在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    /// 查询既有记录
    Lookup,
    /// 删除既有明细+表头
    Delete,
    /// 插入表头
    InsertHeader,
    /// 插入第 n 条明细（从 0 开始）
    InsertDetail(usize),
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStage::Lookup => write!(f, "LOOKUP"),
            SaveStage::Delete => write!(f, "DELETE"),
            SaveStage::InsertHeader => write!(f, "INSERT_HEADER"),
            SaveStage::InsertDetail(idx) => write!(f, "INSERT_DETAIL[{}]", idx),
        }
    }
}

/// 单个聚合保存失败
///
/// 只影响当前聚合，同一文件中的后续聚合继续保存
#[derive(Error, Debug)]
#[error("保存 {key} 失败 (阶段 {stage}): {source}")]
pub struct PersistenceError {
    pub key: String,
    pub stage: SaveStage,
    #[source]
    pub source: RepositoryError,
}

impl PersistenceError {
    pub fn new(key: impl Into<String>, stage: SaveStage, source: RepositoryError) -> Self {
        Self {
            key: key.into(),
            stage,
            source,
        }
    }

    /// 是否可能留下半删除/半插入的残留数据
    pub fn leaves_partial_state(&self) -> bool {
        !matches!(self.stage, SaveStage::Lookup)
    }
}
