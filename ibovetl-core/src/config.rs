//! Pipeline configuration.
//!
//! Bucket names, prefixes, job and table names are process-wide facts, but
//! nothing reads them ambiently: the config is built once (defaults or a TOML
//! file) and injected into each component at construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bucket receiving landed partitions and transformed outputs.
    pub landing_bucket: String,
    /// Key prefix for landed partitions.
    pub landing_prefix: String,
    /// Key prefix for transformed outputs (and the `originals/` archive).
    pub transform_prefix: String,
    /// Managed transformation job started on each landing notification.
    pub transform_job_name: String,
    /// Catalog database receiving the derived tables.
    pub catalog_database: String,
    /// Catalog table for the row-level init dataset.
    pub init_table: String,
    /// Catalog table for the sector-level aggregate dataset.
    pub agg_table: String,
    /// Filename stem for landed files: `{stem}_{YYYY-MM-DD}.parquet`.
    pub file_stem: String,
    /// Extra non-trading dates merged into the holiday calendar
    /// (movable feasts such as Carnival and Corpus Christi).
    pub extra_holidays: Vec<NaiveDate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            landing_bucket: "s3-ibov-fiap-lab".to_string(),
            landing_prefix: "upload".to_string(),
            transform_prefix: "transform".to_string(),
            transform_job_name: "glue-ibov-data-transform".to_string(),
            catalog_database: "fiaplab".to_string(),
            init_table: "ibov_init".to_string(),
            agg_table: "ibov_agg".to_string(),
            file_stem: "b3_data".to_string(),
            extra_holidays: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Landed filename for a trading day: `{stem}_{YYYY-MM-DD}.parquet`.
    pub fn landed_filename(&self, day: NaiveDate) -> String {
        format!("{}_{}.parquet", self.file_stem, day.format("%Y-%m-%d"))
    }
}
