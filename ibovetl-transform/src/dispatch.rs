//! Ingestion-trigger dispatcher.
//!
//! A "new object landed" notification starts exactly one transformation job
//! run, carrying the partition URI and the raw object key as arguments.
//! Malformed keys are expected (out-of-convention uploads share the bucket)
//! and skipped with a warning; a job-start failure is propagated so the
//! hosting runtime can report it.

use ibovetl_core::jobs::{JobError, JobRunner};
use ibovetl_core::partition::parse_key;
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Landing notification: one record per landed object.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEvent {
    pub records: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRecord {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification event carries no records")]
    EmptyEvent,
    #[error(transparent)]
    JobStart(#[from] JobError),
}

/// Outcome of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A transformation job run was started.
    Started { job_run_id: String },
    /// The object key does not follow the partition convention; nothing ran.
    Skipped { key: String },
}

pub struct Dispatcher<'a> {
    runner: &'a dyn JobRunner,
    job_name: &'a str,
    landing_prefix: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(runner: &'a dyn JobRunner, job_name: &'a str, landing_prefix: &'a str) -> Self {
        Self {
            runner,
            job_name,
            landing_prefix,
        }
    }

    /// React to a landing notification.
    ///
    /// Only the first record is processed; multi-record events are a known
    /// limitation of this dispatcher.
    pub fn on_object_landed(&self, event: &ObjectEvent) -> Result<Dispatch, DispatchError> {
        let record = event.records.first().ok_or(DispatchError::EmptyEvent)?;
        info!("object {} landed in bucket {}", record.key, record.bucket);

        let partition = match parse_key(&record.key) {
            Ok(partition) => partition,
            Err(e) => {
                warn!("{e}; not dispatching");
                return Ok(Dispatch::Skipped {
                    key: record.key.clone(),
                });
            }
        };

        let input_path = format!(
            "s3://{}/{}/{}/{}/{}/",
            record.bucket, self.landing_prefix, partition.year, partition.month, partition.day
        );
        let mut arguments = BTreeMap::new();
        arguments.insert("--s3_input_path".to_string(), input_path);
        arguments.insert("--input_file".to_string(), record.key.clone());

        let run = self.runner.start_job(self.job_name, &arguments)?;
        info!("started job '{}', run id {}", self.job_name, run.run_id);
        Ok(Dispatch::Started {
            job_run_id: run.run_id,
        })
    }
}
