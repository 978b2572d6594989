//! Model functions.
//!
//! Models are implemented as small, pure functions so that estimation and
//! simulation code can stay generic.

pub mod arx;
pub mod model;

pub use arx::*;
pub use model::*;
