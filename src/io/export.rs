//! Result and dataset exports.
//!
//! - JSON: fitted parameters plus fit quality, one document per run
//! - CSV: the synthetic data/events files written by `generate`

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::SyntheticData;
use crate::domain::{ArxParams, FitQuality, ModelKind, PtParams};
use crate::error::FitError;

pub const TOOL_NAME: &str = "csvfit";

/// One fitted segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtSegmentResult {
    pub column: String,
    pub event: String,
    pub from: usize,
    pub to: usize,
    pub model: ModelKind,
    pub params: PtParams,
    pub iterations: usize,
    pub quality: FitQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtExport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub data: String,
    pub events: String,
    pub results: Vec<PtSegmentResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxChannel {
    pub input: String,
    pub b0: f64,
    pub b1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxExport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub data: String,
    pub output: String,
    pub y0: f64,
    pub channels: Vec<ArxChannel>,
    pub a1: f64,
    /// Raw coefficient vector `[b00, b01, …, a1]`.
    pub coefficients: ArxParams,
    pub quality: FitQuality,
}

impl ArxExport {
    pub fn new(
        data: &Path,
        inputs: &[String],
        output: &str,
        y0: f64,
        params: &ArxParams,
        quality: FitQuality,
    ) -> Self {
        let channels = inputs
            .iter()
            .enumerate()
            .map(|(n, input)| {
                let (b0, b1) = params.b(n);
                ArxChannel {
                    input: input.clone(),
                    b0,
                    b1,
                }
            })
            .collect();
        Self {
            tool: TOOL_NAME.to_string(),
            generated_at: Utc::now(),
            data: data.display().to_string(),
            output: output.to_string(),
            y0,
            channels,
            a1: params.a1(),
            coefficients: params.clone(),
            quality,
        }
    }
}

impl PtExport {
    pub fn new(data: &Path, events: &Path, results: Vec<PtSegmentResult>) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            generated_at: Utc::now(),
            data: data.display().to_string(),
            events: events.display().to_string(),
            results,
        }
    }
}

/// Pretty-print `value` as JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FitError> {
    let io_err = |source: std::io::Error| FitError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| io_err(e.into()))?;
    writeln!(writer).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Write `time,u1,u2,y` rows.
pub fn write_dataset_csv(path: &Path, data: &SyntheticData, delimiter: u8) -> Result<(), FitError> {
    let d = delimiter as char;
    let io_err = |source: std::io::Error| FitError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = BufWriter::new(File::create(path).map_err(io_err)?);

    writeln!(file, "time{d}u1{d}u2{d}y").map_err(io_err)?;
    for i in 0..data.y.len() {
        writeln!(
            file,
            "{}{d}{}{d}{}{d}{:.10}",
            data.time[i], data.u1[i], data.u2[i], data.y[i]
        )
        .map_err(io_err)?;
    }
    file.flush().map_err(io_err)
}

/// Write the events table: a label column, then one column per segment with
/// its `from` and `to` rows.
pub fn write_events_csv(path: &Path, data: &SyntheticData, delimiter: u8) -> Result<(), FitError> {
    let d = delimiter as char;
    let io_err = |source: std::io::Error| FitError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = BufWriter::new(File::create(path).map_err(io_err)?);

    let names: Vec<&str> = data.events.iter().map(|s| s.name.as_str()).collect();
    let from: Vec<String> = data.events.iter().map(|s| s.from.to_string()).collect();
    let to: Vec<String> = data.events.iter().map(|s| s.to.to_string()).collect();
    let sep = d.to_string();

    writeln!(file, "event-name{d}{}", names.join(&sep)).map_err(io_err)?;
    writeln!(file, "from{d}{}", from.join(&sep)).map_err(io_err)?;
    writeln!(file, "to{d}{}", to.join(&sep)).map_err(io_err)?;
    file.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::two_step_dataset;
    use crate::domain::GenerateConfig;
    use crate::fit::segments;
    use crate::io::{load_data_table, load_events_table};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("csvfit-export-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn dataset() -> SyntheticData {
        two_step_dataset(&GenerateConfig {
            output_dir: std::env::temp_dir(),
            model: ModelKind::Pt1,
            samples: 20,
            span: 100.0,
            gain: 30.0,
            time_constant: 40.0,
            noise: 0.0,
            seed: 1,
            delimiter: b';',
        })
        .unwrap()
    }

    #[test]
    fn generated_files_load_back() {
        let dir = temp_dir("roundtrip");
        let data = dataset();
        let data_path = dir.join("data.csv");
        let events_path = dir.join("events.csv");
        write_dataset_csv(&data_path, &data, b';').unwrap();
        write_events_csv(&events_path, &data, b';').unwrap();

        let cols: Vec<String> = ["time", "u1", "u2", "y"].iter().map(|s| s.to_string()).collect();
        let table = load_data_table(&data_path, &cols).unwrap();
        assert_eq!(table.len(), 40);
        assert_eq!(table.column("u2").unwrap()[20], 2.0);
        let y = table.column("y").unwrap();
        assert!((y[39] - data.y[39]).abs() < 1e-8);

        let events = load_events_table(&events_path).unwrap();
        let segs = segments(&events, table.len(), &[]).unwrap();
        assert_eq!(segs, data.events);
    }

    #[test]
    fn pt_export_is_pretty_json() {
        let dir = temp_dir("json");
        let path = dir.join("fit.json");
        let export = PtExport::new(
            Path::new("data.csv"),
            Path::new("events.csv"),
            vec![PtSegmentResult {
                column: "y".to_string(),
                event: "step1".to_string(),
                from: 0,
                to: 100,
                model: ModelKind::Pt2,
                params: PtParams::new(30.0, 40.0),
                iterations: 7,
                quality: FitQuality {
                    n: 100,
                    rmse: 0.1,
                    max_abs_error: 0.3,
                },
            }],
        );
        write_json(&path, &export).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["tool"], "csvfit");
        assert_eq!(value["results"][0]["model"], "PT2");
        assert_eq!(value["results"][0]["params"]["k"], 30.0);

        let back: PtExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, export);
    }

    #[test]
    fn arx_export_lists_channels_in_order() {
        let params = ArxParams::from_coefficients(vec![1.0, 2.0, 3.0, 4.0, 0.9]).unwrap();
        let quality = FitQuality {
            n: 10,
            rmse: 0.0,
            max_abs_error: 0.0,
        };
        let export = ArxExport::new(
            Path::new("d.csv"),
            &["u1".to_string(), "u2".to_string()],
            "y",
            0.0,
            &params,
            quality,
        );
        assert_eq!(export.channels[1].input, "u2");
        assert_eq!((export.channels[1].b0, export.channels[1].b1), (3.0, 4.0));
        assert_eq!(export.a1, 0.9);

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value["coefficients"].as_array().unwrap().len(), 5);
    }
}
