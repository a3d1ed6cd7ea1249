// ==========================================
// 订单导入服务 - 行格式策略与通用聚合算法
// ==========================================
// 每种伙伴格式提供: 最少列数 / 表头行判定 / 业务主键 / 表头字段 / 明细解析
// 通用算法: 线性扫描，按主键在已构建的结果中线性查找聚合
// 任一行出错即中止整个文件，已构建的聚合一并丢弃
// ==========================================

use crate::domain::aggregate::OrderAggregate;
use crate::importer::cell::SheetRow;
use crate::importer::enrichment::ReferenceEnricher;
use crate::importer::error::ImportResult;

/// 伙伴格式的行解析策略
pub trait RowFormat {
    type Aggregate: OrderAggregate;

    /// 每行要求的最少列数
    const MIN_COLUMNS: usize;

    /// 是否为表头（标题）行
    fn is_header(&self, row: &SheetRow) -> bool;

    fn business_key(&self, row: &SheetRow) -> ImportResult<<Self::Aggregate as OrderAggregate>::Key>;

    /// 用该主键首次出现的行构建表头
    fn new_aggregate(
        &self,
        key: <Self::Aggregate as OrderAggregate>::Key,
        row: &SheetRow,
    ) -> ImportResult<Self::Aggregate>;

    /// 解析明细并完成目录参照
    fn parse_line(
        &self,
        aggregate: &Self::Aggregate,
        row: &SheetRow,
        enricher: &ReferenceEnricher<'_>,
    ) -> ImportResult<<Self::Aggregate as OrderAggregate>::Line>;
}

/// 把行序列聚合为 表头+明细
///
/// # 参数
/// - format: 伙伴格式策略
/// - rows: 解码器产出的行序列
/// - enricher: 目录参照
///
/// # 返回
/// - 按主键首次出现顺序排列的聚合
pub fn parse_rows<F, I>(
    format: &F,
    rows: I,
    enricher: &ReferenceEnricher<'_>,
) -> ImportResult<Vec<F::Aggregate>>
where
    F: RowFormat,
    I: IntoIterator<Item = ImportResult<SheetRow>>,
{
    let mut aggregates: Vec<F::Aggregate> = Vec::new();

    for row in rows {
        let row = row?;
        if format.is_header(&row) {
            continue;
        }

        let key = format.business_key(&row)?;
        let idx = match aggregates.iter().position(|a| a.key() == &key) {
            Some(idx) => idx,
            None => {
                aggregates.push(format.new_aggregate(key, &row)?);
                aggregates.len() - 1
            }
        };

        let line = format.parse_line(&aggregates[idx], &row, enricher)?;
        aggregates[idx].add_line(line);
    }

    Ok(aggregates)
}
