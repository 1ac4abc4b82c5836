//! Catalog collaborator contract and a JSON sidecar implementation.
//!
//! Registration is upsert-by-table: downstream queries always see the latest
//! run's schema and row count. Conflict resolution beyond that is the
//! catalog's own concern.

use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to register {database}.{table}: {reason}")]
    Registration {
        database: String,
        table: String,
        reason: String,
    },
}

pub trait Catalog {
    /// Upsert a table registration for the given frame.
    fn register(
        &self,
        database: &str,
        table: &str,
        frame: &DataFrame,
        context: &str,
    ) -> Result<(), CatalogError>;
}

/// One registered column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub dtype: String,
}

/// Table entry written by `JsonCatalog`: schema, row count, provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub database: String,
    pub table: String,
    pub columns: Vec<CatalogColumn>,
    pub row_count: usize,
    pub context: String,
    pub registered_at: NaiveDateTime,
}

/// Filesystem catalog: one JSON entry per table at
/// `{root}/{database}/{table}.json`, overwritten on every registration.
pub struct JsonCatalog {
    root: PathBuf,
}

impl JsonCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, database: &str, table: &str) -> PathBuf {
        self.root.join(database).join(format!("{table}.json"))
    }

    /// Read back a registration, if one exists.
    pub fn read_entry(&self, database: &str, table: &str) -> Option<CatalogEntry> {
        let text = fs::read_to_string(self.entry_path(database, table)).ok()?;
        serde_json::from_str(&text).ok()
    }
}

impl Catalog for JsonCatalog {
    fn register(
        &self,
        database: &str,
        table: &str,
        frame: &DataFrame,
        context: &str,
    ) -> Result<(), CatalogError> {
        let registration_error = |reason: String| CatalogError::Registration {
            database: database.to_string(),
            table: table.to_string(),
            reason,
        };

        let columns = frame
            .get_columns()
            .iter()
            .map(|col| CatalogColumn {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
            })
            .collect();

        let entry = CatalogEntry {
            database: database.to_string(),
            table: table.to_string(),
            columns,
            row_count: frame.height(),
            context: context.to_string(),
            registered_at: chrono::Local::now().naive_local(),
        };

        let path = self.entry_path(database, table);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| registration_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| registration_error(e.to_string()))?;
        fs::write(&path, json).map_err(|e| registration_error(e.to_string()))?;
        Ok(())
    }
}
