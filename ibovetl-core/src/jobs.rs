//! Job-runtime collaborator contract.
//!
//! The dispatcher starts a named transformation job with string arguments;
//! the managed runtime behind this trait owns scheduling, timeouts, and
//! retries. A `BTreeMap` keeps argument order deterministic for logs and
//! tests.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to start job '{job}': {reason}")]
    Start { job: String, reason: String },
}

/// Handle for one started job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    pub run_id: String,
}

pub trait JobRunner {
    fn start_job(
        &self,
        name: &str,
        arguments: &BTreeMap<String, String>,
    ) -> Result<JobRun, JobError>;
}
