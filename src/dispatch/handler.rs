// ==========================================
// 订单导入服务 - 伙伴格式处理器
// ==========================================
// 一个处理器 = 一种伙伴格式的完整单文件流程:
//   解码 → 解析聚合 → 目录参照 → (替换展开) → 逐个聚合对账写入
// 单个聚合保存失败只记录日志，继续保存后续聚合
// ==========================================

use crate::config::settings::ProcessingConfig;
use crate::domain::aggregate::OrderAggregate;
use crate::domain::partner_a::FORECAST_KEY_PREFIX;
use crate::importer::enrichment::{log_discrepancies, ReferenceEnricher};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SpreadsheetDecoder;
use crate::importer::partner_a_parser::PartnerAFormat;
use crate::importer::partner_b_parser::PartnerBFormat;
use crate::importer::partner_c_parser::PartnerCFormat;
use crate::importer::row_format::{parse_rows, RowFormat};
use crate::importer::substitution_expander::expand_substitutions;
use crate::importer::substitution_parser::load_rules;
use crate::repository::import_store::ImportStore;
use crate::repository::order_records::Persistable;
use crate::repository::reconciliation_writer::ReconciliationWriter;
use crate::repository::record_store::PARTNER_A_TABLES;
use crate::repository::reference_store::{PARTNER_A_CATALOG, PARTNER_B_CATALOG, PARTNER_C_CATALOG};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

// ==========================================
// FileReport - 单文件处理结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    /// 已保存的业务主键
    pub saved: Vec<String>,
    /// 保存失败的业务主键
    pub failed: Vec<String>,
    /// 预测清理删除的订单数
    pub purged: usize,
    /// 替换展开生成的明细数
    pub substituted_lines: usize,
}

impl FileReport {
    pub fn new(file: &Path) -> Self {
        Self {
            file_name: display_name(file),
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub(crate) fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string())
}

/// 单文件处理器
pub trait DropHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// 投递目录中需要忽略（且保留原位）的文件
    fn should_skip(&self, _file: &Path) -> bool {
        false
    }

    fn process(&self, file: &Path, store: &dyn ImportStore) -> ImportResult<FileReport>;
}

/// 逐个保存聚合
fn persist_aggregates<A>(aggregates: &[A], store: &dyn ImportStore, report: &mut FileReport)
where
    A: OrderAggregate + Persistable,
{
    for aggregate in aggregates {
        log_discrepancies(aggregate);

        match ReconciliationWriter::save(store.as_records(), aggregate) {
            Ok(outcome) => {
                info!(
                    target: "processing",
                    "订单 {} 处理完成，共 {} 条明细 (文件 {}{})",
                    aggregate.key(),
                    outcome.detail_count,
                    report.file_name,
                    if outcome.replaced { "，已替换旧记录" } else { "" }
                );
                report.saved.push(aggregate.key_label());
            }
            Err(e) => {
                error!(target: "processing", "文件 {} 中的订单保存失败: {}", report.file_name, e);
                if e.leaves_partial_state() {
                    warn!(
                        target: "processing",
                        "订单 {} 可能残留部分数据 (阶段 {})，重新投递该文件可恢复",
                        e.key, e.stage
                    );
                }
                report.failed.push(e.key);
            }
        }
    }
}

fn decode_and_parse<F: RowFormat>(
    format: &F,
    file: &Path,
    enricher: &ReferenceEnricher<'_>,
) -> ImportResult<Vec<F::Aggregate>> {
    let rows = SpreadsheetDecoder::open(file, F::MIN_COLUMNS)?;
    parse_rows(format, rows, enricher)
}

// ==========================================
// 伙伴 A - 预测订单 / 确认订单
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerAMode {
    /// 主目录；保存前清空全部预测订单
    Forecast,
    /// 副目录
    FirmedOrder,
}

pub struct PartnerAHandler {
    mode: PartnerAMode,
}

impl PartnerAHandler {
    pub fn new(mode: PartnerAMode) -> Self {
        Self { mode }
    }
}

impl DropHandler for PartnerAHandler {
    fn name(&self) -> &'static str {
        match self.mode {
            PartnerAMode::Forecast => "partner-a-forecast",
            PartnerAMode::FirmedOrder => "partner-a-firmed",
        }
    }

    fn process(&self, file: &Path, store: &dyn ImportStore) -> ImportResult<FileReport> {
        let enricher = ReferenceEnricher::new(store.as_reference(), PARTNER_A_CATALOG);
        let orders = decode_and_parse(&PartnerAFormat, file, &enricher)?;

        let mut report = FileReport::new(file);
        if self.mode == PartnerAMode::Forecast {
            report.purged = store
                .as_records()
                .delete_by_key_prefix(&PARTNER_A_TABLES, FORECAST_KEY_PREFIX)?;
            info!(target: "processing", "已清空 {} 个预测订单，准备导入 {}", report.purged, report.file_name);
        }

        persist_aggregates(&orders, store, &mut report);
        Ok(report)
    }
}

// ==========================================
// 伙伴 B
// ==========================================
pub struct PartnerBHandler;

impl DropHandler for PartnerBHandler {
    fn name(&self) -> &'static str {
        "partner-b"
    }

    fn process(&self, file: &Path, store: &dyn ImportStore) -> ImportResult<FileReport> {
        let enricher = ReferenceEnricher::new(store.as_reference(), PARTNER_B_CATALOG);
        let orders = decode_and_parse(&PartnerBFormat, file, &enricher)?;

        let mut report = FileReport::new(file);
        persist_aggregates(&orders, store, &mut report);
        Ok(report)
    }
}

// ==========================================
// 伙伴 C - 销售发票 + 替换展开
// ==========================================
pub struct PartnerCHandler {
    substitution_sheet: Option<PathBuf>,
}

impl PartnerCHandler {
    pub fn new(substitution_sheet: Option<PathBuf>) -> Self {
        Self { substitution_sheet }
    }
}

impl DropHandler for PartnerCHandler {
    fn name(&self) -> &'static str {
        "partner-c"
    }

    /// 替换对照表本身被放入投递目录时原样保留（完整路径比较，不区分大小写）
    fn should_skip(&self, file: &Path) -> bool {
        match &self.substitution_sheet {
            Some(sheet) => sheet.to_string_lossy().to_lowercase() == file.to_string_lossy().to_lowercase(),
            None => false,
        }
    }

    fn process(&self, file: &Path, store: &dyn ImportStore) -> ImportResult<FileReport> {
        let rules = match &self.substitution_sheet {
            Some(sheet) => load_rules(sheet).unwrap_or_else(|e| {
                error!(
                    target: "processing",
                    "替换对照表读取失败，本文件不做替换: {}: {}",
                    sheet.display(),
                    e
                );
                Vec::new()
            }),
            None => Vec::new(),
        };

        let enricher = ReferenceEnricher::new(store.as_reference(), PARTNER_C_CATALOG);
        let mut invoices = decode_and_parse(&PartnerCFormat, file, &enricher)?;

        let mut report = FileReport::new(file);
        report.substituted_lines = expand_substitutions(&mut invoices, &rules, &enricher)?;

        persist_aggregates(&invoices, store, &mut report);
        Ok(report)
    }
}

// ==========================================
// HandlerRegistry - 目录到处理器的绑定
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PartnerFormat {
    A,
    B,
    C,
}

impl PartnerFormat {
    /// 是否使用副目录
    pub fn uses_secondary_directory(&self) -> bool {
        matches!(self, PartnerFormat::A)
    }
}

#[derive(Clone)]
pub struct HandlerRegistry {
    pub primary: Arc<dyn DropHandler>,
    pub secondary: Option<Arc<dyn DropHandler>>,
}

impl HandlerRegistry {
    pub fn new(primary: Arc<dyn DropHandler>, secondary: Option<Arc<dyn DropHandler>>) -> Self {
        Self { primary, secondary }
    }

    /// 按伙伴格式构建处理器
    pub fn for_format(format: PartnerFormat, config: &ProcessingConfig) -> Self {
        match format {
            PartnerFormat::A => Self::new(
                Arc::new(PartnerAHandler::new(PartnerAMode::Forecast)),
                Some(Arc::new(PartnerAHandler::new(PartnerAMode::FirmedOrder))),
            ),
            PartnerFormat::B => Self::new(Arc::new(PartnerBHandler), None),
            PartnerFormat::C => Self::new(
                Arc::new(PartnerCHandler::new(config.substitution_sheet.clone())),
                None,
            ),
        }
    }
}
