// ==========================================
// 订单导入服务 - 替换展开（伙伴 C）
// ==========================================
// 准入: 表头状态 OPEN 且明细状态 OPEN，且料号命中规则
// 展开:
// - 每个派生料号经目录参照，标识与单价均有效才生成派生明细
// - 派生明细数量 = 倍数 × 原数量，沿用原明细的行号与状态
// - 原明细保留，数量置 0
// - 全部明细处理完后追加派生明细，并重算合计
// ==========================================

use crate::domain::partner_c::{PartnerCInvoice, PartnerCInvoiceLine};
use crate::domain::substitution::{find_rule, SubstitutionRule};
use crate::importer::enrichment::ReferenceEnricher;
use crate::importer::error::ImportResult;
use tracing::{debug, info};

/// 对发票集合执行替换展开
///
/// # 返回
/// - 生成的派生明细总数
pub fn expand_substitutions(
    invoices: &mut [PartnerCInvoice],
    rules: &[SubstitutionRule],
    enricher: &ReferenceEnricher<'_>,
) -> ImportResult<usize> {
    if rules.is_empty() {
        return Ok(0);
    }

    let mut emitted = 0;
    for invoice in invoices.iter_mut() {
        if !invoice.status.is_open() {
            continue;
        }
        emitted += expand_invoice(invoice, rules, enricher)?;
    }
    Ok(emitted)
}

fn expand_invoice(
    invoice: &mut PartnerCInvoice,
    rules: &[SubstitutionRule],
    enricher: &ReferenceEnricher<'_>,
) -> ImportResult<usize> {
    let po_number = invoice.po_number;
    let mut derived_lines = Vec::new();

    for line in invoice.lines.iter_mut() {
        if !line.status.is_open() {
            continue;
        }
        let Some(rule) = find_rule(rules, &line.item_number) else {
            continue;
        };

        for derived in rule.derived_items() {
            let reference = enricher.lookup(&derived.item_number)?;
            if !reference.is_resolvable() {
                debug!(
                    target: "pricing",
                    "发票 {} 料号 {} 的派生料号 {} 未在目录中找到，跳过",
                    po_number, line.item_number, derived.item_number
                );
                continue;
            }

            let quantity = derived.multiplier * line.quantity;
            info!(
                target: "pricing",
                "发票 {} 料号 {} 替换为 {} × {} (单价 {:.4})",
                po_number, line.item_number, derived.item_number, quantity, reference.unit_cost
            );
            derived_lines.push(PartnerCInvoiceLine {
                item_number: derived.item_number.clone(),
                line_number: line.line_number.clone(),
                status: line.status.clone(),
                quantity,
                unit_cost: reference.unit_cost,
                catalog_unit_cost: reference.unit_cost,
                catalog_id: reference.identifier,
            });
        }

        line.quantity = 0;
    }

    let emitted = derived_lines.len();
    invoice.lines.extend(derived_lines);
    invoice.recalculate_totals();
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::OrderAggregate;
    use crate::domain::substitution::DerivedItem;
    use crate::domain::types::OrderStatus;
    use crate::repository::error::RepositoryResult;
    use crate::repository::reference_store::{CatalogColumns, ReferenceStore, PARTNER_C_CATALOG};

    struct Catalog;

    impl ReferenceStore for Catalog {
        fn part_identifier(&self, _c: &CatalogColumns, item: &str) -> RepositoryResult<i64> {
            Ok(match item {
                "KIT-X" => 21,
                "BAR-Y" => 22,
                "PACK-1" => 20,
                _ => 0,
            })
        }

        fn part_unit_cost(&self, _c: &CatalogColumns, item: &str) -> RepositoryResult<f64> {
            Ok(match item {
                "KIT-X" => 3.0,
                "BAR-Y" => 1.5,
                "PACK-1" => 10.0,
                _ => 0.0,
            })
        }
    }

    fn rule(kit: &str, bar: &str) -> SubstitutionRule {
        SubstitutionRule {
            source_item_number: "PACK-1".into(),
            source_description: String::new(),
            import_kit: DerivedItem {
                item_number: kit.into(),
                description: String::new(),
                multiplier: 2,
            },
            crossbars: DerivedItem {
                item_number: bar.into(),
                description: String::new(),
                multiplier: 1,
            },
        }
    }

    fn invoice(header: &str, line_status: &str, qty: i64) -> PartnerCInvoice {
        let mut inv = PartnerCInvoice::new(
            7001,
            "SO-1".into(),
            OrderStatus::from_raw(header),
            0,
            String::new(),
            String::new(),
        );
        inv.add_line(PartnerCInvoiceLine {
            item_number: "PACK-1".into(),
            line_number: "3".into(),
            status: OrderStatus::from_raw(line_status),
            quantity: qty,
            unit_cost: 10.0,
            catalog_unit_cost: 10.0,
            catalog_id: 20,
        });
        inv
    }

    #[test]
    fn test_expansion_scales_by_multiplier() {
        let catalog = Catalog;
        let enricher = ReferenceEnricher::new(&catalog, PARTNER_C_CATALOG);
        let mut invoices = vec![invoice("OPEN", "OPEN", 5)];

        let emitted = expand_substitutions(&mut invoices, &[rule("KIT-X", "BAR-Y")], &enricher).unwrap();

        assert_eq!(emitted, 2);
        let lines = &invoices[0].lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].quantity, 0);
        assert_eq!((lines[1].item_number.as_str(), lines[1].quantity), ("KIT-X", 10));
        assert_eq!((lines[2].item_number.as_str(), lines[2].quantity), ("BAR-Y", 5));
        assert_eq!(lines[1].line_number, "3");
        // 10 × 3.0 + 5 × 1.5
        assert!((invoices[0].total_cost() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_unresolvable_derived_item_omitted() {
        let catalog = Catalog;
        let enricher = ReferenceEnricher::new(&catalog, PARTNER_C_CATALOG);
        let mut invoices = vec![invoice("OPEN", "OPEN", 4)];

        expand_substitutions(&mut invoices, &[rule("KIT-X", "UNKNOWN")], &enricher).unwrap();

        let lines = &invoices[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 0);
        assert_eq!(lines[1].quantity, 8);
    }

    #[test]
    fn test_non_open_invoice_or_line_untouched() {
        let catalog = Catalog;
        let enricher = ReferenceEnricher::new(&catalog, PARTNER_C_CATALOG);
        let mut invoices = vec![invoice("HOLD", "OPEN", 4), invoice("OPEN", "SHIPPED", 4)];

        let emitted = expand_substitutions(&mut invoices, &[rule("KIT-X", "BAR-Y")], &enricher).unwrap();

        assert_eq!(emitted, 0);
        assert_eq!(invoices[0].lines.len(), 1);
        assert_eq!(invoices[0].lines[0].quantity, 4);
        assert_eq!(invoices[1].lines[0].quantity, 4);
    }
}
