//! IbovETL Core — domain types, trading calendar, partition paths, and
//! collaborator contracts.
//!
//! This crate contains everything the ingestion and transformation stages
//! share:
//! - Trading-day resolution against the B3 calendar
//! - The `{prefix}/{yyyy}/{mm}/{dd}/{file}` partition path convention
//! - Raw row types and the landed column order
//! - Pipeline configuration (buckets, prefixes, job and table names)
//! - Collaborator traits for the object store, job runtime, and catalog,
//!   plus their local filesystem implementations

pub mod calendar;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod jobs;
pub mod partition;
pub mod store;

pub use calendar::{previous_trading_day, HolidayCalendar};
pub use config::PipelineConfig;
pub use partition::{landed_key, parse_key, PartitionDate, PathError};
