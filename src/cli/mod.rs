//! Command-line parsing for the step-response / ARX fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! estimation code. Arguments are converted into explicit config structs in
//! `crate::app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "csvfit",
    version,
    about = "Offline system identification from CSV: PT1/PT2 step responses and first-order ARX models"
)]
pub struct Cli {
    /// Log filter (`error`, `warn`, `info`, `debug`, `trace`); `RUST_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit PT1/PT2 models to the segments of one or more columns.
    Pt(PtArgs),
    /// Fit a first-order MISO ARX model and simulate it.
    Arx(ArxArgs),
    /// Write a synthetic two-step dataset (data.csv + events.csv).
    Generate(GenerateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PtArgs {
    /// Data file (`,` or `;` delimited, header row).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Events file: label column `event-name`, one column per event, rows `from`/`to`.
    #[arg(long, value_name = "CSV")]
    pub events: PathBuf,

    /// Existing directory for figures.
    #[arg(long, value_name = "DIR", env = "CSVFIT_OUTDIR")]
    pub outdir: PathBuf,

    /// Columns to fit.
    #[arg(long = "column", value_name = "NAME", num_args = 1.., required = true)]
    pub columns: Vec<String>,

    /// Model per column; a single value applies to every column.
    #[arg(long = "type", value_enum, num_args = 1.., required = true)]
    pub types: Vec<ModelKind>,

    /// Time column (the row index is used when omitted).
    #[arg(long, value_name = "NAME")]
    pub time_column: Option<String>,

    /// Only fit these events (default: every event in the events file).
    #[arg(long = "event", value_name = "NAME", num_args = 1..)]
    pub events_only: Vec<String>,

    /// Initial gain on the normalized scale.
    #[arg(long, default_value_t = 1.0)]
    pub k_guess: f64,

    /// Initial time-constant on the normalized scale.
    #[arg(long, default_value_t = 1.0)]
    pub t_guess: f64,

    /// Report failing segments and continue instead of aborting.
    #[arg(long)]
    pub keep_going: bool,

    /// Write fitted parameters to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Open the interactive figure viewer after saving.
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ArxArgs {
    /// Data file (`,` or `;` delimited, header row).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Existing directory for figures.
    #[arg(long, value_name = "DIR", env = "CSVFIT_OUTDIR")]
    pub outdir: PathBuf,

    /// Input columns followed by the output column.
    #[arg(long = "column", value_name = "NAME", num_args = 2.., required = true)]
    pub columns: Vec<String>,

    /// Initial output state for the simulation.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub y0: f64,

    /// Write the coefficients to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Open the interactive figure viewer after saving.
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Existing directory for data.csv / events.csv.
    #[arg(long, value_name = "DIR", env = "CSVFIT_OUTDIR")]
    pub outdir: PathBuf,

    #[arg(long = "type", value_enum, default_value_t = ModelKind::Pt1)]
    pub model: ModelKind,

    /// Samples per step.
    #[arg(long, default_value_t = 100)]
    pub samples: usize,

    /// Time span of each step.
    #[arg(long, default_value_t = 200.0)]
    pub span: f64,

    #[arg(long, default_value_t = 30.0)]
    pub gain: f64,

    #[arg(long, default_value_t = 40.0)]
    pub time_constant: f64,

    /// Gaussian noise amplitude relative to max(y).
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Field delimiter: `,` or `;`.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "," => Ok(b','),
        ";" => Ok(b';'),
        other => Err(format!("unsupported delimiter `{other}` (use `,` or `;`)")),
    }
}
