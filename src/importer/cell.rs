// ==========================================
// 订单导入服务 - 单元格值与行抽象
// ==========================================
// 职责: 把 calamine 单元格统一为带标签的值，按序号取值
// 转换规则:
// - 文本: 去除首尾空白
// - 数值: 明细数值列用 require_number / require_integer，
//         非数值文本返回 CellTypeError；宽松转换只用于替换倍数
// - 日期: 统一输出 YYYY-MM-DD（含时间时附带 HH:MM:SS）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Error(String),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// 空单元格或纯空白文本
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// 文本形式（数值整数不带小数点）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => format_date(dt),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// 宽松数值转换，无法解析时为 0
    pub fn as_f64_lenient(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    /// 宽松整数转换（四舍五入），无法解析时为 0
    pub fn as_i64_lenient(&self) -> i64 {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .unwrap_or_else(|_| trimmed.parse::<f64>().map(|f| f.round() as i64).unwrap_or(0))
            }
            other => other.as_f64_lenient().round() as i64,
        }
    }

    /// 日期文本；日期单元格格式化，其他类型按文本原样保留
    pub fn as_date_text(&self) -> String {
        self.as_text()
    }

    /// 严格数值转换：空单元格为 0，数值文本按数值使用，其余为 None
    pub fn as_f64_checked(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) if s.trim().is_empty() => Some(0.0),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// 严格整数转换（四舍五入）
    pub fn as_i64_checked(&self) -> Option<i64> {
        if let CellValue::Text(s) = self {
            if let Ok(value) = s.trim().parse::<i64>() {
                return Some(value);
            }
        }
        self.as_f64_checked().map(|f| f.round() as i64)
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => CellValue::Date(value),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => parse_iso_datetime(s)
                .map(CellValue::Date)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_date(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

// ==========================================
// SheetRow - 解码后的一行
// ==========================================
// row_number 为工作表中的绝对行号（从 1 开始），cells 按绝对列序号排列
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub row_number: usize,
    pub cells: Vec<CellValue>,
}

impl SheetRow {
    pub fn new(row_number: usize, cells: Vec<CellValue>) -> Self {
        Self { row_number, cells }
    }

    /// 按序号取值，越界视为空单元格
    pub fn cell(&self, ordinal: usize) -> &CellValue {
        self.cells.get(ordinal).unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, ordinal: usize) -> String {
        self.cell(ordinal).as_text()
    }

    /// 宽松整数（仅用于可缺省的倍数 / 版本列）
    pub fn integer(&self, ordinal: usize) -> i64 {
        self.cell(ordinal).as_i64_lenient()
    }

    pub fn date_text(&self, ordinal: usize) -> String {
        self.cell(ordinal).as_date_text()
    }

    /// 必填文本，空值返回 MissingValue
    pub fn require_text(&self, ordinal: usize, field: &str) -> ImportResult<String> {
        let cell = self.cell(ordinal);
        if cell.is_empty() {
            return Err(ImportError::MissingValue {
                row: self.row_number,
                field: field.to_string(),
            });
        }
        Ok(cell.as_text())
    }

    /// 必填数值；非数值内容返回 CellTypeError
    ///
    /// # 参数
    /// - ordinal: 列序号
    /// - field: 字段名（用于错误信息）
    pub fn require_number(&self, ordinal: usize, field: &str) -> ImportResult<f64> {
        let cell = self.cell(ordinal);
        cell.as_f64_checked()
            .ok_or_else(|| self.type_error(field, "数值", cell))
    }

    /// 必填整数；非数值内容返回 CellTypeError
    pub fn require_integer(&self, ordinal: usize, field: &str) -> ImportResult<i64> {
        let cell = self.cell(ordinal);
        cell.as_i64_checked()
            .ok_or_else(|| self.type_error(field, "整数", cell))
    }

    fn type_error(&self, field: &str, expected: &str, cell: &CellValue) -> ImportError {
        ImportError::CellTypeError {
            row: self.row_number,
            field: field.to_string(),
            message: format!("期望{}，实际为 {:?}", expected, cell),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }

    /// 本行实际列数：到最后一个非空单元格为止（含左侧补齐的列）
    pub fn column_count(&self) -> usize {
        self.cells
            .iter()
            .rposition(|c| !matches!(c, CellValue::Empty))
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}
