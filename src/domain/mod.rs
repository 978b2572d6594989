//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the model family enum (`ModelKind`)
//! - data containers (`TimeSeries`, `Segment`, `InputSet`)
//! - fit outputs (`PtParams`, `ArxParams`, `FitQuality`)
//! - per-command configuration structs

pub mod types;

pub use types::*;
