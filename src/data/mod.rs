//! Synthetic data generation.

pub mod sample;

pub use sample::{SyntheticData, add_noise, linspace, two_step_dataset};
