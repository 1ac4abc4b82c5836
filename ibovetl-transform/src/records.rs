//! Typed records for the transform stage.
//!
//! The landed frame is positional and stringly-typed; everything after it is
//! not. `InitRecord` is the row-level cleaned/enriched shape, traceable 1:1
//! to a landed row; `AggregateRecord` is the sector-level summary.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Row-level cleaned and enriched record.
#[derive(Debug, Clone, PartialEq)]
pub struct InitRecord {
    pub setor: String,
    pub codigo: String,
    pub acao: String,
    pub tipo: String,
    pub qtde_teorica: f64,
    pub part_teorica: f64,
    pub part_acum: f64,
    pub date_init: NaiveDate,
    /// Transform-time "today". Wall-clock dependent by contract, so
    /// `diferencas_date` is not stable across calendar days.
    pub date_fim: NaiveDate,
    /// `date_fim - date_init` in whole days; negative for future-dated
    /// partitions, which are valid at this layer.
    pub diferencas_date: i64,
}

/// Sector-level summary of one init batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub setor_agrupado: String,
    pub total_qtde_teorica: f64,
    pub media_part: f64,
}

#[derive(Debug, Error)]
#[error("'{0}' is not a pt-BR formatted number")]
pub struct ParseDecimalError(pub String);

/// Parse a pt-BR formatted decimal: `.` is the thousands separator, `,` the
/// decimal separator. `"1.234,56"` → `1234.56`. Failure is an error carrying
/// the offending value — never a silent zero or NaN.
pub fn parse_decimal_br(value: &str) -> Result<f64, ParseDecimalError> {
    let normalized = value.trim().replace('.', "").replace(',', ".");
    normalized
        .parse()
        .map_err(|_| ParseDecimalError(value.to_string()))
}

/// Group init records by sector: sum of theoretical quantity, mean of
/// participation. Output is sorted by sector so repeated runs over the same
/// batch produce identical frames.
pub fn aggregate(records: &[InitRecord]) -> Vec<AggregateRecord> {
    let mut groups: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.setor.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += record.qtde_teorica;
        entry.1 += record.part_teorica;
        entry.2 += 1;
    }

    groups
        .into_iter()
        .map(|(setor, (total, part_sum, count))| AggregateRecord {
            setor_agrupado: setor.to_string(),
            total_qtde_teorica: total,
            media_part: part_sum / count as f64,
        })
        .collect()
}
