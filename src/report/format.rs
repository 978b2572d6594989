//! Formatted terminal output.
//!
//! Parameter values are printed at full precision; diagnostics are rounded.

use std::fmt::Display;

use crate::domain::{ArxParams, FitQuality, ModelKind, PtParams};

/// `=== <column> (PT1) ===`
pub fn format_column_header(column: &str, model: ModelKind) -> String {
    format!("=== {column} ({}) ===", model.display_name())
}

/// `<event>: (K_opt, T_opt)=(K, T)` followed by the fit diagnostics.
pub fn format_pt_line(event: &str, params: &PtParams, quality: &FitQuality) -> String {
    format!(
        "{event}: (K_opt, T_opt)=({}, {})  {}",
        params.k,
        params.t,
        format_quality(quality)
    )
}

pub fn format_pt_failure(event: &str, err: &dyn Display) -> String {
    format!("{event}: fit failed: {err}")
}

/// Coefficients in fixed order (`b00`, `b01`, `b10`, …, `a1`), then diagnostics.
pub fn format_arx_summary(inputs: &[String], output: &str, params: &ArxParams, quality: &FitQuality) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== ARX: {} -> {output} ===\n", inputs.join(", ")));
    for n in 0..params.channels() {
        let (b0, b1) = params.b(n);
        out.push_str(&format!("b{n}0: {b0}\n"));
        out.push_str(&format!("b{n}1: {b1}\n"));
    }
    out.push_str(&format!("a1: {}\n", params.a1()));
    out.push_str(&format_quality(quality));
    out
}

pub fn format_quality(quality: &FitQuality) -> String {
    format!(
        "rmse={:.6} max|err|={:.6} (n={})",
        quality.rmse, quality.max_abs_error, quality.n
    )
}
