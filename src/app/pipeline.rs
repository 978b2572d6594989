//! Shared pipeline logic behind the `pt`, `arx` and `generate` commands.
//!
//! Each pipeline loads and validates its inputs, runs the estimators, writes
//! figures (and optional exports) and returns the computed outputs so the
//! caller only has to deal with presentation.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::data::two_step_dataset;
use crate::domain::{ArxConfig, FitQuality, GenerateConfig, InputSet, ModelKind, PtConfig, Segment, TimeSeries};
use crate::error::{AppError, FitError};
use crate::fit::{PtFit, PtFitOptions, fit_arx, fit_series, segment_series, segments};
use crate::io::{
    ArxExport, PtExport, PtSegmentResult, load_data_table, load_events_table, write_dataset_csv, write_events_csv,
    write_json,
};
use crate::models::{arxgen, ptgen};
use crate::plot::{Figure, Series, SeriesStyle, write_svg};
use crate::report::compare;

/// A successful segment fit plus the offset-free curves it was judged on.
#[derive(Debug, Clone)]
pub struct SegmentFit {
    pub fit: PtFit,
    pub quality: FitQuality,
    /// `t - t[0]`.
    pub time: Vec<f64>,
    /// `y - y[0]`.
    pub observed: Vec<f64>,
    /// Model response over `time`, without offset.
    pub fitted: Vec<f64>,
}

#[derive(Debug)]
pub struct SegmentRun {
    pub segment: Segment,
    pub outcome: Result<SegmentFit, FitError>,
}

#[derive(Debug)]
pub struct ColumnRun {
    pub column: String,
    pub model: ModelKind,
    pub series: TimeSeries,
    pub segments: Vec<SegmentRun>,
}

/// All computed outputs of a `csvfit pt` run.
#[derive(Debug)]
pub struct PtRunOutput {
    pub columns: Vec<ColumnRun>,
    pub figures: Vec<Figure>,
    pub written: Vec<PathBuf>,
}

/// All computed outputs of a `csvfit arx` run.
#[derive(Debug)]
pub struct ArxRunOutput {
    pub params: crate::domain::ArxParams,
    pub quality: FitQuality,
    pub simulated: Vec<f64>,
    pub figures: Vec<Figure>,
    pub written: Vec<PathBuf>,
}

/// Fit every selected segment of every target column.
pub fn run_pt(config: &PtConfig) -> Result<PtRunOutput, AppError> {
    let mut required: Vec<String> = config.targets.iter().map(|(c, _)| c.clone()).collect();
    if let Some(time) = &config.time_column {
        if !required.contains(time) {
            required.push(time.clone());
        }
    }

    tracing::info!(path = %config.data_path.display(), "loading data");
    let table = load_data_table(&config.data_path, &required)?;
    let events = load_events_table(&config.events_path)?;
    let segs = segments(&events, table.len(), &config.events)?;
    tracing::info!(rows = table.len(), segments = segs.len(), "inputs validated");

    let time = match &config.time_column {
        Some(name) => table.column(name)?.to_vec(),
        None => (0..table.len()).map(|i| i as f64).collect(),
    };

    let options = PtFitOptions {
        guess: config.guess,
        ..PtFitOptions::default()
    };

    let mut columns = Vec::with_capacity(config.targets.len());
    for (column, model) in &config.targets {
        let series = TimeSeries::new(time.clone(), table.column(column)?.to_vec())?;
        tracing::info!(column = %column, model = model.display_name(), "fitting segments");

        // Segments are independent; collect() keeps events-table order.
        let runs: Vec<SegmentRun> = segs
            .par_iter()
            .map(|segment| SegmentRun {
                segment: segment.clone(),
                outcome: fit_segment(&series, segment, *model, &options),
            })
            .collect();

        for run in &runs {
            if let Err(err) = &run.outcome {
                if !config.keep_going {
                    return Err(AppError::new(
                        err.exit_code(),
                        format!("column `{column}`, event `{}`: {err}", run.segment.name),
                    ));
                }
                tracing::warn!(column = %column, event = %run.segment.name, error = %err, "segment fit failed, continuing");
            }
        }

        columns.push(ColumnRun {
            column: column.clone(),
            model: *model,
            series,
            segments: runs,
        });
    }

    let figures: Vec<Figure> = columns.iter().flat_map(pt_figures).collect();
    let written = write_figures(&figures, config)?;

    if let Some(path) = &config.export {
        let export = PtExport::new(&config.data_path, &config.events_path, export_rows(&columns));
        write_json(path, &export)?;
        tracing::info!(path = %path.display(), "results exported");
    }

    Ok(PtRunOutput {
        columns,
        figures,
        written,
    })
}

fn fit_segment(
    series: &TimeSeries,
    segment: &Segment,
    model: ModelKind,
    options: &PtFitOptions,
) -> Result<SegmentFit, FitError> {
    let sub = segment_series(series, segment)?;
    let fit = fit_series(model, &sub, options)?;

    let t0 = sub.time()[0];
    let y0 = sub.values()[0];
    let time: Vec<f64> = sub.time().iter().map(|t| t - t0).collect();
    let observed: Vec<f64> = sub.values().iter().map(|y| y - y0).collect();
    let fitted = ptgen(model, &time, fit.params, 0.0)?;
    let quality = compare(&observed, &fitted)?;

    Ok(SegmentFit {
        fit,
        quality,
        time,
        observed,
        fitted,
    })
}

fn pt_figures(run: &ColumnRun) -> Vec<Figure> {
    let mut timeslots = Figure::new(
        format!("timeslots_{}", run.column),
        format!("{}: time slots", run.column),
        "t",
        &run.column,
    )
    .with_series(Series::from_xy(
        run.column.as_str(),
        run.series.time(),
        run.series.values(),
        SeriesStyle::Line,
    ));
    for seg in &run.segments {
        let range = seg.segment.range();
        timeslots = timeslots.with_series(Series::from_xy(
            seg.segment.name.as_str(),
            &run.series.time()[range.clone()],
            &run.series.values()[range],
            SeriesStyle::Line,
        ));
    }

    let mut out = vec![timeslots];
    for seg in &run.segments {
        let Ok(fit) = &seg.outcome else { continue };
        let params = fit.fit.params;
        out.push(
            Figure::new(
                format!("{}_{}_fit", run.column, seg.segment.name),
                format!(
                    "{} {}: {} K={:.4} T={:.4}",
                    run.column,
                    seg.segment.name,
                    run.model.display_name(),
                    params.k,
                    params.t
                ),
                "t - t0",
                &format!("{} - y0", run.column),
            )
            .with_series(Series::from_xy("data", &fit.time, &fit.observed, SeriesStyle::Line))
            .with_series(Series::from_xy(
                format!("{} fit", run.model.display_name()),
                &fit.time,
                &fit.fitted,
                SeriesStyle::Dashed,
            )),
        );
    }
    out
}

fn export_rows(columns: &[ColumnRun]) -> Vec<PtSegmentResult> {
    columns
        .iter()
        .flat_map(|col| {
            col.segments.iter().filter_map(move |seg| {
                let fit = seg.outcome.as_ref().ok()?;
                Some(PtSegmentResult {
                    column: col.column.clone(),
                    event: seg.segment.name.clone(),
                    from: seg.segment.from,
                    to: seg.segment.to,
                    model: col.model,
                    params: fit.fit.params,
                    iterations: fit.fit.iterations,
                    quality: fit.quality,
                })
            })
        })
        .collect()
}

fn write_figures(figures: &[Figure], config: &PtConfig) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::with_capacity(figures.len());
    for figure in figures {
        written.push(write_svg(figure, &config.output_dir)?);
    }
    tracing::info!(count = written.len(), dir = %config.output_dir.display(), "figures written");
    Ok(written)
}

/// Fit the ARX model, simulate it and compare with the measured output.
pub fn run_arx(config: &ArxConfig) -> Result<ArxRunOutput, AppError> {
    let mut required = config.input_columns.clone();
    required.push(config.output_column.clone());

    tracing::info!(path = %config.data_path.display(), "loading data");
    let table = load_data_table(&config.data_path, &required)?;

    let channels = config
        .input_columns
        .iter()
        .map(|name| table.column(name).map(<[f64]>::to_vec))
        .collect::<Result<Vec<_>, _>>()?;
    let inputs = InputSet::new(channels)?;
    let y = table.column(&config.output_column)?;

    let params = fit_arx(&inputs, y)?;
    let simulated = arxgen(&inputs, &params, config.y0)?;
    let quality = compare(&y[1..], &simulated)?;
    tracing::info!(channels = params.channels(), rmse = quality.rmse, "ARX model fitted");

    let index: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    let figure = Figure::new(
        format!("arx_{}_fit", config.output_column),
        format!("ARX: {} -> {}", config.input_columns.join(", "), config.output_column),
        "k",
        &config.output_column,
    )
    .with_series(Series::from_xy("measured", &index, y, SeriesStyle::Line))
    .with_series(Series::from_xy("simulated", &index[1..], &simulated, SeriesStyle::Dashed));

    let written = vec![write_svg(&figure, &config.output_dir)?];

    if let Some(path) = &config.export {
        let export = ArxExport::new(
            &config.data_path,
            &config.input_columns,
            &config.output_column,
            config.y0,
            &params,
            quality,
        );
        write_json(path, &export)?;
        tracing::info!(path = %path.display(), "coefficients exported");
    }

    Ok(ArxRunOutput {
        params,
        quality,
        simulated,
        figures: vec![figure],
        written,
    })
}

/// Write `data.csv` and `events.csv`; returns their paths.
pub fn run_generate(config: &GenerateConfig) -> Result<(PathBuf, PathBuf), AppError> {
    let data = two_step_dataset(config)?;
    let data_path = config.output_dir.join("data.csv");
    let events_path = config.output_dir.join("events.csv");
    write_dataset_csv(&data_path, &data, config.delimiter)?;
    write_events_csv(&events_path, &data, config.delimiter)?;
    tracing::info!(
        rows = data.y.len(),
        model = config.model.display_name(),
        seed = config.seed,
        "synthetic dataset written"
    );
    Ok((data_path, events_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PtParams;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("csvfit-pipeline-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn generate(dir: &std::path::Path, noise: f64) {
        run_generate(&GenerateConfig {
            output_dir: dir.to_path_buf(),
            model: ModelKind::Pt1,
            samples: 100,
            span: 200.0,
            gain: 30.0,
            time_constant: 40.0,
            noise,
            seed: 42,
            delimiter: b',',
        })
        .unwrap();
    }

    fn pt_config(dir: &std::path::Path) -> PtConfig {
        PtConfig {
            data_path: dir.join("data.csv"),
            events_path: dir.join("events.csv"),
            output_dir: dir.to_path_buf(),
            targets: vec![("y".to_string(), ModelKind::Pt1)],
            time_column: Some("time".to_string()),
            events: Vec::new(),
            guess: PtParams::default(),
            keep_going: false,
            export: Some(dir.join("fit.json")),
            show: false,
        }
    }

    #[test]
    fn pt_pipeline_end_to_end() {
        let dir = temp_dir("pt");
        generate(&dir, 0.0);
        let out = run_pt(&pt_config(&dir)).unwrap();

        let col = &out.columns[0];
        assert_eq!(col.segments.len(), 2);
        let first = col.segments[0].outcome.as_ref().unwrap();
        let second = col.segments[1].outcome.as_ref().unwrap();
        assert!((first.fit.params.k - 30.0).abs() < 1e-4, "{:?}", first.fit.params);
        assert!((first.fit.params.t - 40.0).abs() < 1e-4, "{:?}", first.fit.params);
        // Second step: gain x0.4, time-constant x0.6 on top of the first.
        assert!((second.fit.params.k - 12.0).abs() < 1e-4, "{:?}", second.fit.params);
        assert!((second.fit.params.t - 24.0).abs() < 1e-4, "{:?}", second.fit.params);

        for name in ["timeslots_y.svg", "y_step1_fit.svg", "y_step2_fit.svg"] {
            assert!(dir.join(name).is_file(), "{name} missing");
        }
        assert_eq!(out.written.len(), 3);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("fit.json")).unwrap()).unwrap();
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
        assert_eq!(json["results"][1]["event"], "step2");
    }

    #[test]
    fn row_index_time_and_event_selection() {
        let dir = temp_dir("pt-index");
        generate(&dir, 0.0);
        let mut config = pt_config(&dir);
        config.time_column = None;
        config.events = vec!["step2".to_string()];
        config.export = None;

        let out = run_pt(&config).unwrap();
        let segs = &out.columns[0].segments;
        assert_eq!(segs.len(), 1);
        // 100 samples over 200 time units: T = 24 time units is 24 * 99 / 200 samples.
        let fit = segs[0].outcome.as_ref().unwrap();
        assert!((fit.fit.params.t - 24.0 * 99.0 / 200.0).abs() < 1e-4, "{:?}", fit.fit.params);
    }

    #[test]
    fn failing_segment_aborts_or_is_isolated() {
        let dir = temp_dir("pt-fail");
        std::fs::write(dir.join("data.csv"), "y\n0\n2.922\n4.418\n5.185\n5.578\n5.6\n5.6\n5.6\n").unwrap();
        std::fs::write(dir.join("events.csv"), "event-name,rise,flat\nfrom,0,5\nto,5,8\n").unwrap();
        let mut config = pt_config(&dir);
        config.time_column = None;
        config.export = None;

        let err = run_pt(&config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("flat"), "{err}");

        config.keep_going = true;
        let out = run_pt(&config).unwrap();
        let segs = &out.columns[0].segments;
        assert!(segs[0].outcome.is_ok());
        assert!(matches!(segs[1].outcome, Err(FitError::DegenerateInput(_))));
        assert!(!dir.join("y_flat_fit.svg").exists());
    }

    #[test]
    fn arx_pipeline_end_to_end() {
        let dir = temp_dir("arx");
        generate(&dir, 0.0);
        let config = ArxConfig {
            data_path: dir.join("data.csv"),
            output_dir: dir.clone(),
            input_columns: vec!["u1".to_string(), "u2".to_string()],
            output_column: "y".to_string(),
            y0: 0.0,
            export: Some(dir.join("arx.json")),
            show: false,
        };
        let out = run_arx(&config).unwrap();
        assert_eq!(out.params.channels(), 2);
        assert_eq!(out.simulated.len(), 199);
        assert!(out.quality.max_abs_error < 0.1 * 42.0, "{:?}", out.quality);
        assert!(dir.join("arx_y_fit.svg").is_file());
        assert!(dir.join("arx.json").is_file());
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let dir = temp_dir("arx-missing");
        generate(&dir, 0.0);
        let config = ArxConfig {
            data_path: dir.join("data.csv"),
            output_dir: dir.clone(),
            input_columns: vec!["u9".to_string()],
            output_column: "y".to_string(),
            y0: 0.0,
            export: None,
            show: false,
        };
        let err = run_arx(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
