//! IbovETL Ingest — extraction from the B3 index page and landing of the
//! daily composition table as partitioned parquet.
//!
//! - `extract`: filter selection + positional row mapping behind the
//!   `IndexPage` collaborator trait
//! - `b3`: the concrete B3 page client (JSON endpoint behind the listed
//!   indexes site)
//! - `land`: parquet serialization into a scratch dir and upload to the
//!   partitioned landing key

pub mod b3;
pub mod extract;
pub mod land;

pub use extract::{extract, ExtractError, IndexPage};
pub use land::{LandedObject, LandingWriter};
