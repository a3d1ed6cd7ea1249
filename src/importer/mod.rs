// ==========================================
// 订单导入服务 - 导入层
// ==========================================
// 职责: 电子表格解码 → 伙伴格式解析 → 目录参照 → 替换展开
// 支持: 伙伴 A / 伙伴 B / 伙伴 C 三种版式
// ==========================================

// 模块声明
pub mod cell;
pub mod enrichment;
pub mod error;
pub mod file_parser;
pub mod partner_a_parser;
pub mod partner_b_parser;
pub mod partner_c_parser;
pub mod row_format;
pub mod substitution_expander;
pub mod substitution_parser;

// 重导出核心类型
pub use cell::{CellValue, SheetRow};
pub use enrichment::{log_discrepancies, ReferenceEnricher};
pub use error::{ImportError, ImportResult};
pub use file_parser::{is_spreadsheet_name, SheetRows, SpreadsheetDecoder};
pub use partner_a_parser::PartnerAFormat;
pub use partner_b_parser::PartnerBFormat;
pub use partner_c_parser::PartnerCFormat;
pub use row_format::{parse_rows, RowFormat};
pub use substitution_expander::expand_substitutions;
pub use substitution_parser::load_rules;
