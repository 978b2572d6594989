//! Parameter estimation.
//!
//! - PT1 / PT2 step-response fits (`pt`)
//! - first-order MISO ARX fits (`arx`)
//! - events-table segmentation (`segment`)

pub mod arx;
pub mod pt;
pub mod segment;

pub use arx::*;
pub use pt::*;
pub use segment::*;
