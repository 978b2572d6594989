//! `csvfit` library crate.
//!
//! The binary (`csvfit`) is a thin wrapper around this library so that:
//!
//! - the estimators are testable without spawning processes
//! - the fitting core (`models`, `math`, `fit`) has no I/O and can be reused on its own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
