//! Object-store collaborator contract and the local filesystem backend.
//!
//! The production deployment talks to an S3-compatible store; everything in
//! the core goes through the `ObjectStore` trait so the pipeline stays
//! testable and the cloud SDK stays at the edge. `FsObjectStore` maps buckets
//! to subdirectories of a root path and backs tests and local runs.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("upload failed for {bucket}/{key}: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("I/O error for {bucket}/{key}: {reason}")]
    Io {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("parquet error for {bucket}/{key}: {reason}")]
    Parquet {
        bucket: String,
        key: String,
        reason: String,
    },
}

/// Reference to one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// Narrow object-store interface: exactly what the pipeline needs.
pub trait ObjectStore {
    /// Upload a local file to `bucket/key`, overwriting any existing object.
    fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// List objects under a key prefix. An absent prefix lists as empty.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRef>, StoreError>;

    /// Copy an object within a bucket.
    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), StoreError>;

    /// Read a parquet object into a DataFrame.
    fn read_parquet(&self, bucket: &str, key: &str) -> Result<DataFrame, StoreError>;

    /// Write a DataFrame as a parquet object.
    fn write_parquet(&self, df: &mut DataFrame, bucket: &str, key: &str)
        -> Result<(), StoreError>;
}

/// Filesystem-backed object store: `{root}/{bucket}/{key}`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.root.join(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }

    fn ensure_parent(&self, path: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Collect every file under `dir`, depth-first.
fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

impl ObjectStore for FsObjectStore {
    fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        let dst = self.object_path(bucket, key);
        self.ensure_parent(&dst, bucket, key)?;
        fs::copy(local, &dst).map_err(|e| StoreError::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRef>, StoreError> {
        let bucket_root = self.root.join(bucket);
        if !bucket_root.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        walk_files(&bucket_root, &mut paths).map_err(|e| StoreError::Io {
            bucket: bucket.to_string(),
            key: prefix.to_string(),
            reason: e.to_string(),
        })?;

        let mut objects: Vec<ObjectRef> = paths
            .into_iter()
            .filter_map(|path| {
                let rel = path.strip_prefix(&bucket_root).ok()?;
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                key.starts_with(prefix).then(|| ObjectRef {
                    bucket: bucket.to_string(),
                    key,
                })
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn copy(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<(), StoreError> {
        let src = self.object_path(bucket, src_key);
        if !src.exists() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: src_key.to_string(),
            });
        }
        let dst = self.object_path(bucket, dst_key);
        self.ensure_parent(&dst, bucket, dst_key)?;
        fs::copy(&src, &dst).map_err(|e| StoreError::Io {
            bucket: bucket.to_string(),
            key: dst_key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn read_parquet(&self, bucket: &str, key: &str) -> Result<DataFrame, StoreError> {
        let path = self.object_path(bucket, key);
        if !path.exists() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let file = fs::File::open(&path).map_err(|e| StoreError::Io {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| StoreError::Parquet {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_parquet(
        &self,
        df: &mut DataFrame,
        bucket: &str,
        key: &str,
    ) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key);
        self.ensure_parent(&path, bucket, key)?;
        let file = fs::File::create(&path).map_err(|e| StoreError::Io {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        ParquetWriter::new(file)
            .finish(df)
            .map_err(|e| StoreError::Parquet {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
