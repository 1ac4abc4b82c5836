//! Transform engine: landed partitions become the init and aggregate
//! datasets.
//!
//! One invocation scans the whole landing prefix and processes every object
//! that matches the partition convention. Partitions are independent: a
//! numeric-parse or catalog failure aborts that partition only and is
//! reported in the summary; a listing failure fails the run. Re-running over
//! an unchanged partition with the same transform date produces identical
//! outputs.

use crate::clean::normalize_frame;
use crate::records::{aggregate, parse_decimal_br, AggregateRecord, InitRecord};
use chrono::NaiveDate;
use ibovetl_core::catalog::{Catalog, CatalogError};
use ibovetl_core::config::PipelineConfig;
use ibovetl_core::partition::parse_key;
use ibovetl_core::store::{ObjectStore, StoreError};
use log::{error, info};
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("landed frame is missing column '{0}'")]
    MissingColumn(String),
    #[error("column '{column}' holds non-numeric value '{value}'")]
    NumericParse { column: String, value: String },
    #[error("column '{column}' holds unparseable date '{value}'")]
    DateParse { column: String, value: String },
    #[error("frame error: {0}")]
    Frame(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Result of one transformed partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub key: String,
    pub init_count: usize,
    pub agg_count: usize,
}

/// Whole-run summary: transformed partitions plus independent failures.
#[derive(Debug, Default)]
pub struct TransformSummary {
    pub processed: Vec<PartitionReport>,
    pub failed: Vec<(String, TransformError)>,
}

pub struct TransformEngine<'a> {
    store: &'a dyn ObjectStore,
    catalog: &'a dyn Catalog,
    config: &'a PipelineConfig,
    today: NaiveDate,
}

impl<'a> TransformEngine<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        catalog: &'a dyn Catalog,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Freeze the transform date. `diferencas_date` and `date_fim` derive
    /// from it, so tests inject a fixed day to get reproducible outputs.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Scan the landing prefix and transform every partition-conventional
    /// parquet object.
    pub fn run(&self) -> Result<TransformSummary, TransformError> {
        let prefix = format!("{}/", self.config.landing_prefix);
        let objects = self.store.list(&self.config.landing_bucket, &prefix)?;

        let mut summary = TransformSummary::default();
        for object in objects {
            if !is_candidate(&object.key) {
                continue;
            }
            match self.process_partition(&object.key) {
                Ok(report) => {
                    info!(
                        "transformed {}: {} init rows, {} aggregate rows",
                        report.key, report.init_count, report.agg_count
                    );
                    summary.processed.push(report);
                }
                Err(e) => {
                    error!("transform failed for partition {}: {e}", object.key);
                    summary.failed.push((object.key, e));
                }
            }
        }
        Ok(summary)
    }

    fn process_partition(&self, key: &str) -> Result<PartitionReport, TransformError> {
        let bucket = &self.config.landing_bucket;

        let mut df = self.store.read_parquet(bucket, key)?;
        normalize_frame(&mut df).map_err(|e| TransformError::Frame(e.to_string()))?;

        let records = frame_to_records(&df, self.today)?;
        let aggregates = aggregate(&records);

        let filename = key.rsplit('/').next().unwrap_or(key);
        let out = &self.config.transform_prefix;

        let mut init_df = init_frame(&records)?;
        let mut agg_df = agg_frame(&aggregates)?;

        self.store
            .write_parquet(&mut init_df, bucket, &format!("{out}/init_{filename}"))?;
        self.store
            .write_parquet(&mut agg_df, bucket, &format!("{out}/agg_{filename}"))?;

        self.catalog.register(
            &self.config.catalog_database,
            &self.config.init_table,
            &init_df,
            "init_ctx",
        )?;
        self.catalog.register(
            &self.config.catalog_database,
            &self.config.agg_table,
            &agg_df,
            "agg_ctx",
        )?;

        // Copy, not move: the untouched source stays available for replay.
        self.store
            .copy(bucket, key, &format!("{out}/originals/{filename}"))?;

        Ok(PartitionReport {
            key: key.to_string(),
            init_count: records.len(),
            agg_count: aggregates.len(),
        })
    }
}

/// Candidate for transformation: parquet extension plus exactly the
/// `{prefix}/{yyyy}/{mm}/{dd}/{file}` layout (5 path segments).
fn is_candidate(key: &str) -> bool {
    key.ends_with(".parquet") && key.split('/').count() == 5 && parse_key(key).is_ok()
}

fn str_column<'f>(df: &'f DataFrame, name: &str) -> Result<&'f StringChunked, TransformError> {
    df.column(name)
        .map_err(|_| TransformError::MissingColumn(name.to_string()))?
        .str()
        .map_err(|e| TransformError::Frame(e.to_string()))
}

/// Turn a normalized landed frame into typed init records, 1:1 with its rows.
fn frame_to_records(df: &DataFrame, today: NaiveDate) -> Result<Vec<InitRecord>, TransformError> {
    let setor = str_column(df, "setor")?;
    let codigo = str_column(df, "codigo")?;
    let acao = str_column(df, "acao")?;
    let tipo = str_column(df, "tipo")?;
    let qtde = str_column(df, "qtde_teorica")?;
    let part = str_column(df, "part_teorica")?;
    let part_acum = str_column(df, "part_acum")?;
    let date_init = str_column(df, "date_init")?;

    let cell = |ca: &StringChunked, column: &str, i: usize| -> Result<String, TransformError> {
        ca.get(i)
            .map(str::to_string)
            .ok_or_else(|| TransformError::Frame(format!("null value in '{column}' at row {i}")))
    };
    let number = |value: &str, column: &str| -> Result<f64, TransformError> {
        parse_decimal_br(value).map_err(|_| TransformError::NumericParse {
            column: column.to_string(),
            value: value.to_string(),
        })
    };

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let date_value = cell(date_init, "date_init", i)?;
        let date = NaiveDate::parse_from_str(&date_value, "%Y-%m-%d").map_err(|_| {
            TransformError::DateParse {
                column: "date_init".to_string(),
                value: date_value.clone(),
            }
        })?;

        records.push(InitRecord {
            setor: cell(setor, "setor", i)?,
            codigo: cell(codigo, "codigo", i)?,
            acao: cell(acao, "acao", i)?,
            tipo: cell(tipo, "tipo", i)?,
            qtde_teorica: number(&cell(qtde, "qtde_teorica", i)?, "qtde_teorica")?,
            part_teorica: number(&cell(part, "part_teorica", i)?, "part_teorica")?,
            part_acum: number(&cell(part_acum, "part_acum", i)?, "part_acum")?,
            date_init: date,
            date_fim: today,
            diferencas_date: (today - date).num_days(),
        });
    }
    Ok(records)
}

/// Init records as the row-level output frame.
fn init_frame(records: &[InitRecord]) -> Result<DataFrame, TransformError> {
    let strings = |f: fn(&InitRecord) -> &String| -> Vec<String> {
        records.iter().map(|r| f(r).clone()).collect()
    };
    let dates = |f: fn(&InitRecord) -> NaiveDate| -> Vec<String> {
        records
            .iter()
            .map(|r| f(r).format("%Y-%m-%d").to_string())
            .collect()
    };

    DataFrame::new(vec![
        Column::new("setor".into(), strings(|r| &r.setor)),
        Column::new("codigo".into(), strings(|r| &r.codigo)),
        Column::new("acao".into(), strings(|r| &r.acao)),
        Column::new("tipo".into(), strings(|r| &r.tipo)),
        Column::new(
            "qtde_teorica".into(),
            records.iter().map(|r| r.qtde_teorica).collect::<Vec<f64>>(),
        ),
        Column::new(
            "part_teorica".into(),
            records.iter().map(|r| r.part_teorica).collect::<Vec<f64>>(),
        ),
        Column::new(
            "part_acum".into(),
            records.iter().map(|r| r.part_acum).collect::<Vec<f64>>(),
        ),
        Column::new("date_init".into(), dates(|r| r.date_init)),
        Column::new("date_fim".into(), dates(|r| r.date_fim)),
        Column::new(
            "diferencas_date".into(),
            records
                .iter()
                .map(|r| r.diferencas_date)
                .collect::<Vec<i64>>(),
        ),
    ])
    .map_err(|e| TransformError::Frame(e.to_string()))
}

/// Aggregate records as the sector-level output frame.
fn agg_frame(aggregates: &[AggregateRecord]) -> Result<DataFrame, TransformError> {
    DataFrame::new(vec![
        Column::new(
            "setor_agrupado".into(),
            aggregates
                .iter()
                .map(|a| a.setor_agrupado.clone())
                .collect::<Vec<String>>(),
        ),
        Column::new(
            "total_qtde_teorica".into(),
            aggregates
                .iter()
                .map(|a| a.total_qtde_teorica)
                .collect::<Vec<f64>>(),
        ),
        Column::new(
            "media_part".into(),
            aggregates.iter().map(|a| a.media_part).collect::<Vec<f64>>(),
        ),
    ])
    .map_err(|e| TransformError::Frame(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_filter_requires_the_full_convention() {
        assert!(is_candidate("upload/2024/06/03/b3_data_2024-06-03.parquet"));
        // wrong extension
        assert!(!is_candidate("upload/2024/06/03/b3_data.csv"));
        // too shallow
        assert!(!is_candidate("upload/2024/06/file.parquet"));
        // too deep
        assert!(!is_candidate("upload/2024/06/03/extra/file.parquet"));
        // non-numeric date segments
        assert!(!is_candidate("upload/aaaa/mm/dd/file.parquet"));
    }

    fn landed_test_frame(qtde: &str) -> DataFrame {
        DataFrame::new(vec![
            Column::new("setor".into(), vec!["Financeiro"]),
            Column::new("codigo".into(), vec!["ABCD4"]),
            Column::new("acao".into(), vec!["Banco ABC"]),
            Column::new("tipo".into(), vec!["ON"]),
            Column::new("qtde_teorica".into(), vec![qtde]),
            Column::new("part_teorica".into(), vec!["10,5"]),
            Column::new("part_acum".into(), vec!["10,5"]),
            Column::new("date_init".into(), vec!["2024-06-03"]),
        ])
        .unwrap()
    }

    #[test]
    fn records_carry_the_date_difference() {
        let df = landed_test_frame("1.000");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let records = frame_to_records(&df, today).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qtde_teorica, 1000.0);
        assert_eq!(records[0].diferencas_date, 7);
        assert_eq!(records[0].date_fim, today);
    }

    #[test]
    fn future_dated_partitions_yield_negative_differences() {
        let df = landed_test_frame("1.000");
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let records = frame_to_records(&df, today).unwrap();
        assert_eq!(records[0].diferencas_date, -2);
    }

    #[test]
    fn non_numeric_quantity_aborts_with_context() {
        let df = landed_test_frame("N/A");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let result = frame_to_records(&df, today);
        match result {
            Err(TransformError::NumericParse { column, value }) => {
                assert_eq!(column, "qtde_teorica");
                assert_eq!(value, "N/A");
            }
            other => panic!("expected NumericParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let df = DataFrame::new(vec![Column::new("setor".into(), vec!["Financeiro"])]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(matches!(
            frame_to_records(&df, today),
            Err(TransformError::MissingColumn(name)) if name == "codigo"
        ));
    }
}
