//! Owned figure descriptions and their Plotters rendering.
//!
//! A [`Figure`] is plain data (series + labels). It is rendered by
//! [`draw_figure`] onto any Plotters drawing area, so the same figure ends up
//! in an SVG file (`svg`) or in the terminal viewer (`crate::tui`).

pub mod svg;

use plotters::coord::Shift;
use plotters::prelude::*;

pub use svg::*;

/// Points per dash when drawing a dashed polyline.
const DASH_POINTS: usize = 3;

static PAPER_PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

static TERMINAL_PALETTE: [RGBColor; 5] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 255, 0),
    RGBColor(0, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(255, 0, 0),
];

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    Line,
    Dashed,
    Points,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>, style: SeriesStyle) -> Self {
        Self {
            label: label.into(),
            points,
            style,
        }
    }

    /// Zip `x` and `y` into points.
    pub fn from_xy(label: impl Into<String>, x: &[f64], y: &[f64], style: SeriesStyle) -> Self {
        Self::new(label, x.iter().copied().zip(y.iter().copied()).collect(), style)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// File stem, e.g. `y_step1_fit`.
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(name: impl Into<String>, title: impl Into<String>, x_label: &str, y_label: &str) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Axis bounds covering every finite point, with 5 % vertical padding.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for &(px, py) in self.series.iter().flat_map(|s| s.points.iter()) {
            if !(px.is_finite() && py.is_finite()) {
                continue;
            }
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        if !x[0].is_finite() {
            return None;
        }

        if x[1] <= x[0] {
            x = [x[0] - 0.5, x[0] + 0.5];
        }
        let pad = if y[1] > y[0] { 0.05 * (y[1] - y[0]) } else { 0.5 };
        Some((x, [y[0] - pad, y[1] + pad]))
    }
}

/// Colors and label styling for one output medium.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Option<RGBColor>,
    pub foreground: RGBColor,
    pub palette: &'static [RGBColor],
    pub font_size: u32,
    pub caption: bool,
    pub legend: bool,
    /// Draw point series as single pixels instead of circles.
    pub pixel_markers: bool,
    pub label_area: (u32, u32),
}

impl Theme {
    /// Dark-on-white, used for files.
    pub fn paper() -> Self {
        Self {
            background: Some(WHITE),
            foreground: BLACK,
            palette: &PAPER_PALETTE,
            font_size: 16,
            caption: true,
            legend: true,
            pixel_markers: false,
            label_area: (60, 40),
        }
    }

    /// High-contrast colors on the terminal background.
    pub fn terminal() -> Self {
        Self {
            background: None,
            foreground: WHITE,
            palette: &TERMINAL_PALETTE,
            font_size: 10,
            caption: false,
            legend: false,
            pixel_markers: true,
            label_area: (8, 3),
        }
    }

    fn color(&self, idx: usize) -> RGBColor {
        self.palette[idx % self.palette.len()]
    }
}

/// Render `figure` into `root`.
pub fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    theme: &Theme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if let Some(bg) = theme.background {
        root.fill(&bg)?;
    }
    let Some((x, y)) = figure.bounds() else {
        return Ok(());
    };

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(if theme.caption { 12 } else { 1 })
        .set_label_area_size(LabelAreaPosition::Left, theme.label_area.0)
        .set_label_area_size(LabelAreaPosition::Bottom, theme.label_area.1);
    if theme.caption {
        builder.caption(&figure.title, ("sans-serif", theme.font_size + 4).into_font().color(&theme.foreground));
    }
    let mut chart = builder.build_cartesian_2d(x[0]..x[1], y[0]..y[1])?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .x_labels(6)
        .y_labels(6)
        .x_label_formatter(&|v| format_tick(*v))
        .y_label_formatter(&|v| format_tick(*v))
        .label_style(("sans-serif", theme.font_size).into_font().color(&theme.foreground))
        .axis_style(theme.foreground)
        .draw()?;

    for (idx, series) in figure.series.iter().enumerate() {
        let color = theme.color(idx);
        let style = color.stroke_width(2);
        let anno = match series.style {
            SeriesStyle::Line => chart.draw_series(LineSeries::new(series.points.iter().copied(), style))?,
            SeriesStyle::Dashed => chart.draw_series(
                series
                    .points
                    .chunks(DASH_POINTS)
                    .step_by(2)
                    .map(|dash| PathElement::new(dash.to_vec(), style)),
            )?,
            SeriesStyle::Points if theme.pixel_markers => {
                chart.draw_series(series.points.iter().map(|&p| Pixel::new(p, color)))?
            }
            SeriesStyle::Points => {
                chart.draw_series(series.points.iter().map(|&p| Circle::new(p, 2, color.filled())))?
            }
        };
        if theme.legend {
            anno.label(series.label.as_str())
                .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + 20, ly)], style));
        }
    }

    if theme.legend && !figure.series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(theme.foreground)
            .label_font(("sans-serif", theme.font_size).into_font().color(&theme.foreground))
            .draw()?;
    }
    Ok(())
}

fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e5).contains(&a) {
        format!("{v:.2e}")
    } else if a >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_series_with_padding() {
        let fig = Figure::new("f", "t", "x", "y")
            .with_series(Series::from_xy("a", &[0.0, 1.0], &[0.0, 10.0], SeriesStyle::Line))
            .with_series(Series::from_xy("b", &[2.0], &[5.0], SeriesStyle::Points));
        let (x, y) = fig.bounds().unwrap();
        assert_eq!(x, [0.0, 2.0]);
        assert!((y[0] + 0.5).abs() < 1e-12);
        assert!((y[1] - 10.5).abs() < 1e-12);
    }

    #[test]
    fn degenerate_bounds_are_widened() {
        let fig = Figure::new("f", "t", "x", "y").with_series(Series::from_xy(
            "a",
            &[3.0, 3.0],
            &[1.0, 1.0],
            SeriesStyle::Line,
        ));
        let (x, y) = fig.bounds().unwrap();
        assert!(x[1] > x[0]);
        assert!(y[1] > y[0]);

        assert!(Figure::new("e", "t", "x", "y").bounds().is_none());
    }

    #[test]
    fn tick_labels_switch_to_scientific() {
        assert_eq!(format_tick(0.0), "0.00");
        assert_eq!(format_tick(12.5), "12.50");
        assert_eq!(format_tick(250.0), "250");
        assert_eq!(format_tick(1.0e6), "1.00e6");
    }
}
