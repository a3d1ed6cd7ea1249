// ==========================================
// 订单导入服务 - 替换规则模型（伙伴 C）
// ==========================================
// 来源: 替换对照表（首两行为固定标题，不参与解析）
// 一条规则 = 原料号 → 两个派生料号（各带整数倍数）
// ==========================================

use serde::{Deserialize, Serialize};

/// 派生料号 + 数量倍数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedItem {
    pub item_number: String,
    pub description: String,
    pub multiplier: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    pub source_item_number: String,
    pub source_description: String,
    /// 进口套件
    pub import_kit: DerivedItem,
    /// 横梁
    pub crossbars: DerivedItem,
}

impl SubstitutionRule {
    pub fn derived_items(&self) -> [&DerivedItem; 2] {
        [&self.import_kit, &self.crossbars]
    }
}

/// 按原料号查找第一条匹配规则
pub fn find_rule<'a>(rules: &'a [SubstitutionRule], item_number: &str) -> Option<&'a SubstitutionRule> {
    rules.iter().find(|rule| rule.source_item_number == item_number)
}
