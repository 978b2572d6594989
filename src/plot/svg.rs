//! SVG figure files.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use super::{Figure, Theme, draw_figure};
use crate::error::AppError;

pub const FIGURE_SIZE: (u32, u32) = (1000, 600);

/// Write `figure` to `<dir>/<figure.name>.svg` and return the path.
pub fn write_svg(figure: &Figure, dir: &Path) -> Result<PathBuf, AppError> {
    let path = dir.join(format!("{}.svg", sanitize_file_stem(&figure.name)));
    {
        let root = SVGBackend::new(&path, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, figure, &Theme::paper())
            .and_then(|()| root.present())
            .map_err(|e| AppError::new(4, format!("Failed to render figure '{}': {e}", path.display())))?;
    }
    tracing::debug!(path = %path.display(), "figure written");
    Ok(path)
}

/// Keep column/event names usable as file names.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Series, SeriesStyle};

    #[test]
    fn writes_svg_file() {
        let dir = std::env::temp_dir().join(format!("csvfit-svg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fig = Figure::new("y_step1_fit", "PT1 fit", "t", "y")
            .with_series(Series::from_xy("data", &[0.0, 1.0, 2.0], &[0.0, 0.6, 0.9], SeriesStyle::Points))
            .with_series(Series::from_xy("fit", &[0.0, 1.0, 2.0], &[0.0, 0.63, 0.86], SeriesStyle::Dashed));

        let path = write_svg(&fig, &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "y_step1_fit.svg");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn file_stems_are_sanitized() {
        assert_eq!(sanitize_file_stem("flow rate/step 1"), "flow_rate_step_1");
        assert_eq!(sanitize_file_stem("y_step1_fit"), "y_step1_fit");
    }
}
