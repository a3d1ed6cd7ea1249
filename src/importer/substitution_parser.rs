// ==========================================
// 订单导入服务 - 替换对照表解析（伙伴 C）
// ==========================================
// 版式: 第 1、2 行为固定标题，从第 3 行开始为规则
// 列: 1 原料号 / 2 描述 / 4-6 进口套件(数量/料号/描述) / 8-10 横梁(数量/料号/描述)
// 原料号为空的行跳过；数量可为数值或数字文本，无法解析时为 0
// 描述列可缺省，不做最少列数校验
// ==========================================

use crate::domain::substitution::{DerivedItem, SubstitutionRule};
use crate::importer::cell::SheetRow;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SpreadsheetDecoder;
use crate::importer::partner_c_parser::trim_item_marker;
use std::path::Path;

const SHIPPABLE_PACK: usize = 1;
const SHIPPABLE_PACK_DESCRIPTION: usize = 2;
const IMPORT_KIT_QUANTITY: usize = 4;
const IMPORT_KIT: usize = 5;
const IMPORT_KIT_DESCRIPTION: usize = 6;
const CROSSBARS_QUANTITY: usize = 8;
const CROSSBARS: usize = 9;
const CROSSBARS_DESCRIPTION: usize = 10;

/// 固定标题行数
pub const BANNER_ROWS: usize = 2;

/// 解析单行规则；原料号为空时返回 None
pub fn parse_rule(row: &SheetRow) -> Option<SubstitutionRule> {
    let source_item_number = trim_item_marker(&row.text(SHIPPABLE_PACK));
    if source_item_number.is_empty() {
        return None;
    }

    Some(SubstitutionRule {
        source_item_number,
        source_description: row.text(SHIPPABLE_PACK_DESCRIPTION),
        import_kit: DerivedItem {
            item_number: trim_item_marker(&row.text(IMPORT_KIT)),
            description: row.text(IMPORT_KIT_DESCRIPTION),
            multiplier: row.integer(IMPORT_KIT_QUANTITY),
        },
        crossbars: DerivedItem {
            item_number: trim_item_marker(&row.text(CROSSBARS)),
            description: row.text(CROSSBARS_DESCRIPTION),
            multiplier: row.integer(CROSSBARS_QUANTITY),
        },
    })
}

/// 从行序列解析规则列表
pub fn parse_rules<I>(rows: I) -> ImportResult<Vec<SubstitutionRule>>
where
    I: IntoIterator<Item = ImportResult<SheetRow>>,
{
    let mut rules = Vec::new();
    for row in rows {
        let row = row?;
        if row.row_number <= BANNER_ROWS {
            continue;
        }
        if let Some(rule) = parse_rule(&row) {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// 读取替换对照表文件
pub fn load_rules(path: &Path) -> ImportResult<Vec<SubstitutionRule>> {
    let rows = SpreadsheetDecoder::open(path, 0)?;
    parse_rules(rows)
}
