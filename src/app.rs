//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments into validated configs
//! - runs the requested pipeline
//! - prints reports and optionally opens the figure viewer

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{ArxArgs, Cli, Command, GenerateArgs, PtArgs};
use crate::domain::{ArxConfig, GenerateConfig, PtConfig, PtParams};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `csvfit` binary.
pub fn run() -> Result<(), AppError> {
    // Optional; a missing .env is not an error.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Pt(args) => handle_pt(&pt_config_from_args(&args)?),
        Command::Arx(args) => handle_arx(&arx_config_from_args(&args)?),
        Command::Generate(args) => handle_generate(&generate_config_from_args(&args)?),
    }
}

/// Install the stderr fmt subscriber; `RUST_LOG` overrides `--log-level`.
fn init_tracing(level: &str) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| AppError::new(2, format!("Invalid --log-level '{level}': {e}")))?,
    };
    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

fn handle_pt(config: &PtConfig) -> Result<(), AppError> {
    let run = pipeline::run_pt(config)?;

    for column in &run.columns {
        println!("{}", crate::report::format_column_header(&column.column, column.model));
        for seg in &column.segments {
            match &seg.outcome {
                Ok(fit) => println!(
                    "{}",
                    crate::report::format_pt_line(&seg.segment.name, &fit.fit.params, &fit.quality)
                ),
                Err(err) => println!("{}", crate::report::format_pt_failure(&seg.segment.name, err)),
            }
        }
    }
    print_written(&run.written);

    if config.show {
        crate::tui::show(run.figures)?;
    }
    Ok(())
}

fn handle_arx(config: &ArxConfig) -> Result<(), AppError> {
    let run = pipeline::run_arx(config)?;
    println!(
        "{}",
        crate::report::format_arx_summary(&config.input_columns, &config.output_column, &run.params, &run.quality)
    );
    print_written(&run.written);

    if config.show {
        crate::tui::show(run.figures)?;
    }
    Ok(())
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("wrote {}", path.display());
    }
}

fn handle_generate(config: &GenerateConfig) -> Result<(), AppError> {
    let (data, events) = pipeline::run_generate(config)?;
    print_written(&[data, events]);
    Ok(())
}

pub fn pt_config_from_args(args: &PtArgs) -> Result<PtConfig, AppError> {
    ensure_output_dir(&args.outdir)?;

    let targets = match args.types.len() {
        1 => args.columns.iter().map(|c| (c.clone(), args.types[0])).collect(),
        n if n == args.columns.len() => args.columns.iter().cloned().zip(args.types.iter().copied()).collect(),
        n => {
            return Err(AppError::new(
                2,
                format!(
                    "--type takes one value for all columns or one per column: got {n} types for {} columns",
                    args.columns.len()
                ),
            ));
        }
    };

    if !args.k_guess.is_finite() {
        return Err(AppError::new(2, "--k-guess must be finite."));
    }
    if !(args.t_guess.is_finite() && args.t_guess > 0.0) {
        return Err(AppError::new(2, "--t-guess must be finite and > 0."));
    }

    Ok(PtConfig {
        data_path: args.data.clone(),
        events_path: args.events.clone(),
        output_dir: args.outdir.clone(),
        targets,
        time_column: args.time_column.clone(),
        events: args.events_only.clone(),
        guess: PtParams::new(args.k_guess, args.t_guess),
        keep_going: args.keep_going,
        export: args.export.clone(),
        show: args.show,
    })
}

pub fn arx_config_from_args(args: &ArxArgs) -> Result<ArxConfig, AppError> {
    ensure_output_dir(&args.outdir)?;

    let Some((output, inputs)) = args.columns.split_last().filter(|(_, inputs)| !inputs.is_empty()) else {
        return Err(AppError::new(
            2,
            "--column needs at least one input column followed by the output column.",
        ));
    };
    if !args.y0.is_finite() {
        return Err(AppError::new(2, "--y0 must be finite."));
    }

    Ok(ArxConfig {
        data_path: args.data.clone(),
        output_dir: args.outdir.clone(),
        input_columns: inputs.to_vec(),
        output_column: output.clone(),
        y0: args.y0,
        export: args.export.clone(),
        show: args.show,
    })
}

pub fn generate_config_from_args(args: &GenerateArgs) -> Result<GenerateConfig, AppError> {
    ensure_output_dir(&args.outdir)?;

    if args.samples < 2 {
        return Err(AppError::new(2, "--samples must be at least 2."));
    }
    if !(args.span.is_finite() && args.span > 0.0) {
        return Err(AppError::new(2, "--span must be finite and > 0."));
    }
    if !(args.time_constant.is_finite() && args.time_constant > 0.0) {
        return Err(AppError::new(2, "--time-constant must be finite and > 0."));
    }
    if !args.gain.is_finite() {
        return Err(AppError::new(2, "--gain must be finite."));
    }
    if !(args.noise.is_finite() && args.noise >= 0.0) {
        return Err(AppError::new(2, "--noise must be finite and >= 0."));
    }

    Ok(GenerateConfig {
        output_dir: args.outdir.clone(),
        model: args.model,
        samples: args.samples,
        span: args.span,
        gain: args.gain,
        time_constant: args.time_constant,
        noise: args.noise,
        seed: args.seed,
        delimiter: args.delimiter,
    })
}

fn ensure_output_dir(dir: &Path) -> Result<(), AppError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AppError::new(
            2,
            format!("Output directory '{}' does not exist.", dir.display()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn pt_args(columns: &[&str], types: &[ModelKind]) -> PtArgs {
        PtArgs {
            data: "data.csv".into(),
            events: "events.csv".into(),
            outdir: std::env::temp_dir(),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            types: types.to_vec(),
            time_column: None,
            events_only: Vec::new(),
            k_guess: 1.0,
            t_guess: 1.0,
            keep_going: false,
            export: None,
            show: false,
        }
    }

    #[test]
    fn single_type_applies_to_all_columns() {
        let config = pt_config_from_args(&pt_args(&["a", "b"], &[ModelKind::Pt2])).unwrap();
        assert_eq!(
            config.targets,
            vec![("a".to_string(), ModelKind::Pt2), ("b".to_string(), ModelKind::Pt2)]
        );
    }

    #[test]
    fn types_bind_per_column() {
        let config = pt_config_from_args(&pt_args(&["a", "b"], &[ModelKind::Pt1, ModelKind::Pt2])).unwrap();
        assert_eq!(config.targets[1], ("b".to_string(), ModelKind::Pt2));

        let err = pt_config_from_args(&pt_args(&["a", "b", "c"], &[ModelKind::Pt1, ModelKind::Pt2])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_bad_guess_and_missing_outdir() {
        let mut args = pt_args(&["a"], &[ModelKind::Pt1]);
        args.t_guess = 0.0;
        assert_eq!(pt_config_from_args(&args).unwrap_err().exit_code(), 2);

        let mut args = pt_args(&["a"], &[ModelKind::Pt1]);
        args.outdir = std::env::temp_dir().join("csvfit-no-such-dir");
        assert_eq!(pt_config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn arx_splits_inputs_and_output() {
        let args = ArxArgs {
            data: "data.csv".into(),
            outdir: std::env::temp_dir(),
            columns: vec!["u1".to_string(), "u2".to_string(), "y".to_string()],
            y0: 0.0,
            export: None,
            show: false,
        };
        let config = arx_config_from_args(&args).unwrap();
        assert_eq!(config.input_columns, vec!["u1", "u2"]);
        assert_eq!(config.output_column, "y");
    }

    #[test]
    fn generate_validates_ranges() {
        let args = GenerateArgs {
            outdir: std::env::temp_dir(),
            model: ModelKind::Pt1,
            samples: 1,
            span: 200.0,
            gain: 30.0,
            time_constant: 40.0,
            noise: 0.02,
            seed: 42,
            delimiter: b',',
        };
        assert_eq!(generate_config_from_args(&args).unwrap_err().exit_code(), 2);
    }
}
