//! IbovETL Transform — from landed partitions to queryable datasets.
//!
//! - `dispatch`: a "new object landed" notification starts one
//!   transformation job run
//! - `clean`: column-name normalization and canonical renames
//! - `records`: typed init/aggregate records, pt-BR numeric parsing, and the
//!   sector aggregation
//! - `engine`: the transform itself — read, normalize, coerce, enrich,
//!   aggregate, persist, register, archive

pub mod clean;
pub mod dispatch;
pub mod engine;
pub mod records;

pub use dispatch::{Dispatch, DispatchError, Dispatcher, ObjectEvent, ObjectRecord};
pub use engine::{PartitionReport, TransformEngine, TransformError, TransformSummary};
