//! Numerical building blocks: normalization, nonlinear and linear least squares.

pub mod lm;
pub mod normalize;
pub mod ols;

pub use lm::*;
pub use normalize::*;
pub use ols::*;
