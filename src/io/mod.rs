//! Input/output helpers.
//!
//! - delimited-text ingest + validation (`ingest`)
//! - JSON result export and synthetic dataset CSVs (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
