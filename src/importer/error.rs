// ==========================================
// 订单导入服务 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 任一 ImportError 都会中止当前文件的解析，
//       文件整体转入错误目录
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xls/.xlsx/.xlsm/.xlsb）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    // ===== 行结构错误 =====
    #[error("列数不足 (行 {row}): 期望至少 {expected} 列，实际 {found} 列")]
    ColumnCountError {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("必填单元格为空 (行 {row}, 字段 {field})")]
    MissingValue { row: usize, field: String },

    #[error("单元格类型错误 (行 {row}, 字段 {field}): {message}")]
    CellTypeError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("料号格式错误 (行 {row}): {value}")]
    ItemNumberFormat { row: usize, value: String },

    // ===== 数据库错误（目录查询 / 预测清理） =====
    #[error("数据库操作失败: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
