// ==========================================
// 订单导入服务 - 电子表格解码器
// ==========================================
// 支持: .xls / .xlsx / .xlsm / .xlsb（投递目录匹配 *.xl*）
// 行为:
// - 只读取第一个工作表
// - 工作簿在 open 内读取后立即释放，文件句柄不随行序列存活
// - 行序列单次、只进、惰性；每行按最后一个非空单元格校验最少列数
// - 完全空白的行直接跳过
// ==========================================

use crate::importer::cell::{CellValue, SheetRow};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// 支持的扩展名（小写）
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["xls", "xlsx", "xlsm", "xlsb"];

/// 是否匹配投递目录的 *.xl* 通配
pub fn is_spreadsheet_name(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase().starts_with("xl"))
        .unwrap_or(false)
}

// ==========================================
// SpreadsheetDecoder
// ==========================================
pub struct SpreadsheetDecoder;

impl SpreadsheetDecoder {
    /// 打开工作簿并返回第一个工作表的行序列
    ///
    /// # 参数
    /// - path: 文件路径
    /// - min_columns: 每行要求的最少列数
    ///
    /// # 返回
    /// - Ok(SheetRows): 惰性行序列
    /// - Err(ImportError): 文件不存在 / 扩展名不支持 / 工作簿无法读取
    pub fn open(path: &Path, min_columns: usize) -> ImportResult<SheetRows> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let range = {
            let mut workbook = open_workbook_auto(path)?;
            let sheet_name = workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
            workbook.worksheet_range(&sheet_name)?
        };

        Ok(SheetRows::new(range, min_columns))
    }
}

// ==========================================
// SheetRows - 惰性行序列
// ==========================================
pub struct SheetRows {
    range: Range<Data>,
    next_index: usize,
    min_columns: usize,
    failed: bool,
}

impl SheetRows {
    fn new(range: Range<Data>, min_columns: usize) -> Self {
        Self {
            range,
            next_index: 0,
            min_columns,
            failed: false,
        }
    }

    /// 取出第 index 行（相对于已用区域），左侧补齐空单元格使序号为绝对列号
    fn build_row(&self, index: usize) -> SheetRow {
        let (start_row, start_col) = self
            .range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let width = self.range.width();

        let mut cells = Vec::with_capacity(start_col + width);
        cells.resize(start_col, CellValue::Empty);
        for col in 0..width {
            let cell = self
                .range
                .get((index, col))
                .map(CellValue::from)
                .unwrap_or(CellValue::Empty);
            cells.push(cell);
        }

        SheetRow::new(start_row + index + 1, cells)
    }
}

impl Iterator for SheetRows {
    type Item = ImportResult<SheetRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while self.next_index < self.range.height() {
            let row = self.build_row(self.next_index);
            self.next_index += 1;

            if row.is_blank() {
                continue;
            }

            if row.column_count() < self.min_columns {
                self.failed = true;
                return Some(Err(ImportError::ColumnCountError {
                    row: row.row_number,
                    expected: self.min_columns,
                    found: row.column_count(),
                }));
            }

            return Some(Ok(row));
        }

        None
    }
}
