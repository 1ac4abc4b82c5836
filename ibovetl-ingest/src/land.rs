//! Landing writer: extracted rows become an immutable parquet partition.
//!
//! Serialization happens in a `TempDir` scratch so the local copy is released
//! on every exit path, including upload failure. One file per run; re-running
//! the same trading day overwrites the same key, which is the idempotency
//! contract of the landing area.

use chrono::NaiveDate;
use ibovetl_core::config::PipelineConfig;
use ibovetl_core::domain::{RawRow, DATE_COLUMN, LANDED_COLUMNS};
use ibovetl_core::partition::landed_key;
use ibovetl_core::store::{ObjectStore, StoreError};
use log::info;
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LandError {
    #[error("failed to build landed frame: {0}")]
    Frame(String),
    #[error("failed to write scratch parquet: {0}")]
    Scratch(String),
    #[error("upload failed: {0}")]
    Upload(#[from] StoreError),
}

/// Reference to a successfully landed dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandedObject {
    pub bucket: String,
    pub key: String,
    pub rows: usize,
}

pub struct LandingWriter<'a> {
    store: &'a dyn ObjectStore,
    config: &'a PipelineConfig,
}

impl<'a> LandingWriter<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: &'a PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Serialize `rows` plus the trading-day column and upload to the
    /// partitioned landing key.
    pub fn land(
        &self,
        rows: &[RawRow],
        trading_day: NaiveDate,
    ) -> Result<LandedObject, LandError> {
        let mut df = landed_frame(rows, trading_day)?;

        let filename = self.config.landed_filename(trading_day);
        let key = landed_key(&self.config.landing_prefix, trading_day, &filename);

        // Dropped (and deleted) on every exit path below.
        let scratch = tempfile::tempdir().map_err(|e| LandError::Scratch(e.to_string()))?;
        let local = scratch.path().join(&filename);
        let file =
            std::fs::File::create(&local).map_err(|e| LandError::Scratch(e.to_string()))?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .map_err(|e| LandError::Scratch(e.to_string()))?;

        self.store
            .upload(&local, &self.config.landing_bucket, &key)?;
        info!(
            "landed {} rows at {}/{}",
            rows.len(),
            self.config.landing_bucket,
            key
        );

        Ok(LandedObject {
            bucket: self.config.landing_bucket.clone(),
            key,
            rows: rows.len(),
        })
    }
}

/// Extracted rows + trading day as a DataFrame in the landed column order.
fn landed_frame(rows: &[RawRow], trading_day: NaiveDate) -> Result<DataFrame, LandError> {
    let day = trading_day.format("%Y-%m-%d").to_string();
    let column = |name: &str, values: Vec<String>| Column::new(name.into(), values);

    DataFrame::new(vec![
        column(
            LANDED_COLUMNS[0],
            rows.iter().map(|r| r.setor.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[1],
            rows.iter().map(|r| r.codigo.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[2],
            rows.iter().map(|r| r.acao.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[3],
            rows.iter().map(|r| r.tipo.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[4],
            rows.iter().map(|r| r.qtde_teorica.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[5],
            rows.iter().map(|r| r.part.clone()).collect(),
        ),
        column(
            LANDED_COLUMNS[6],
            rows.iter().map(|r| r.part_acum.clone()).collect(),
        ),
        column(DATE_COLUMN, vec![day; rows.len()]),
    ])
    .map_err(|e| LandError::Frame(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibovetl_core::store::FsObjectStore;
    use std::path::Path;

    fn sample_rows() -> Vec<RawRow> {
        vec![
            RawRow {
                setor: "Financeiro".to_string(),
                codigo: "ABCD4".to_string(),
                acao: "Banco ABC".to_string(),
                tipo: "ON".to_string(),
                qtde_teorica: "1.000".to_string(),
                part: "10,5".to_string(),
                part_acum: "10,5".to_string(),
            },
            RawRow {
                setor: "Financeiro".to_string(),
                codigo: "EFGH3".to_string(),
                acao: "Banco EFG".to_string(),
                tipo: "PN".to_string(),
                qtde_teorica: "2.000".to_string(),
                part: "5,25".to_string(),
                part_acum: "15,75".to_string(),
            },
        ]
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn lands_at_the_partitioned_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let config = PipelineConfig::default();

        let landed = LandingWriter::new(&store, &config)
            .land(&sample_rows(), day())
            .unwrap();

        assert_eq!(landed.key, "upload/2024/06/03/b3_data_2024-06-03.parquet");
        assert_eq!(landed.rows, 2);

        let df = store.read_parquet(&landed.bucket, &landed.key).unwrap();
        assert_eq!(df.height(), 2);
        let dates = df.column(DATE_COLUMN).unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("2024-06-03"));
        assert_eq!(
            df.column("Qtde. Teórica").unwrap().str().unwrap().get(1),
            Some("2.000")
        );
    }

    #[test]
    fn relanding_the_same_day_overwrites_the_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path());
        let config = PipelineConfig::default();
        let writer = LandingWriter::new(&store, &config);

        writer.land(&sample_rows(), day()).unwrap();
        let second = writer.land(&sample_rows()[..1], day()).unwrap();

        let df = store.read_parquet(&second.bucket, &second.key).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(store.list(&second.bucket, "upload/").unwrap().len(), 1);
    }

    /// Store that always refuses uploads.
    struct RefusingStore;

    impl ObjectStore for RefusingStore {
        fn upload(&self, _: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
            Err(StoreError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "access denied".to_string(),
            })
        }

        fn list(&self, _: &str, _: &str) -> Result<Vec<ibovetl_core::store::ObjectRef>, StoreError> {
            Ok(Vec::new())
        }

        fn copy(&self, _: &str, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn read_parquet(&self, bucket: &str, key: &str) -> Result<DataFrame, StoreError> {
            Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
        }

        fn write_parquet(&self, _: &mut DataFrame, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn upload_failure_surfaces_as_land_error() {
        let config = PipelineConfig::default();
        let result = LandingWriter::new(&RefusingStore, &config).land(&sample_rows(), day());
        assert!(matches!(result, Err(LandError::Upload(_))));
    }
}
