//! Plotters-powered figure widget for Ratatui.
//!
//! The same [`draw_figure`] used for SVG files renders into the terminal
//! buffer through `plotters-ratatui-backend`, with the terminal theme.

use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{Figure, Theme, draw_figure};

/// Render-only view of one figure.
pub struct FigureChart<'a> {
    pub figure: &'a Figure,
}

impl Widget for FigureChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let figure = self.figure;
        let theme = Theme::terminal();
        let widget = widget_fn(move |root| {
            draw_figure(&root, figure, &theme)?;
            Ok(())
        });

        widget.render(area, buf);
    }
}
