//! Ratatui-based figure viewer.
//!
//! Pages through the figures produced by a run: `←`/`→` (or `h`/`l`) move
//! between figures, `q`/`Esc` quits.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::error::AppError;
use crate::plot::{Figure, SeriesStyle, Theme};

mod plotters_chart;

use plotters_chart::FigureChart;

/// Show `figures` until the user quits.
pub fn show(figures: Vec<Figure>) -> Result<(), AppError> {
    if figures.is_empty() {
        tracing::info!("no figures to show");
        return Ok(());
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer::new(figures);
    viewer.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Viewer {
    figures: Vec<Figure>,
    index: usize,
}

impl Viewer {
    fn new(figures: Vec<Figure>) -> Self {
        Self { figures, index: 0 }
    }

    fn next(&mut self) {
        if self.index + 1 < self.figures.len() {
            self.index += 1;
        }
    }

    fn prev(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Returns `true` when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => self.next(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => self.prev(),
            KeyCode::Home => self.index = 0,
            KeyCode::End => self.index = self.figures.len().saturating_sub(1),
            _ => {}
        }
        false
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        let figure = &self.figures[self.index];
        self.draw_header(frame, chunks[0], figure);
        draw_chart(frame, chunks[1], figure);
        self.draw_footer(frame, chunks[2], figure);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect, figure: &Figure) {
        let lines = vec![
            Line::from(vec![
                Span::styled("csvfit", Style::default().fg(Color::Cyan)),
                Span::raw(format!("  {}/{}  ", self.index + 1, self.figures.len())),
                Span::raw(figure.title.clone()),
            ]),
            legend_line(figure),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect, figure: &Figure) {
        let line = Line::from(vec![
            Span::styled("←/→ figure  Home/End first/last  q quit", Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(format!("{}.svg", figure.name), Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, figure: &Figure) {
    let block = Block::default()
        .title(format!("{} vs {}", figure.y_label, figure.x_label))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);
    frame.render_widget(FigureChart { figure }, inner);
}

/// Series labels in their chart colors.
fn legend_line(figure: &Figure) -> Line<'static> {
    let theme = Theme::terminal();
    let mut spans = Vec::new();
    for (idx, series) in figure.series.iter().enumerate() {
        let c = theme.palette[idx % theme.palette.len()];
        let marker = match series.style {
            SeriesStyle::Line => "──",
            SeriesStyle::Dashed => "- -",
            SeriesStyle::Points => "··",
        };
        if idx > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!("{marker} {}", series.label),
            Style::default().fg(Color::Rgb(c.0, c.1, c.2)),
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::Series;

    fn figures(n: usize) -> Vec<Figure> {
        (0..n)
            .map(|i| Figure::new(format!("f{i}"), format!("figure {i}"), "t", "y"))
            .collect()
    }

    #[test]
    fn paging_stays_in_range() {
        let mut v = Viewer::new(figures(3));
        v.handle_key(KeyCode::Left);
        assert_eq!(v.index, 0);
        v.handle_key(KeyCode::Right);
        v.handle_key(KeyCode::Right);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.index, 2);
        v.handle_key(KeyCode::Home);
        assert_eq!(v.index, 0);
        v.handle_key(KeyCode::End);
        assert_eq!(v.index, 2);
        assert!(v.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn legend_lists_series_labels() {
        let fig = Figure::new("f", "t", "x", "y")
            .with_series(Series::from_xy("data", &[0.0], &[0.0], SeriesStyle::Line))
            .with_series(Series::from_xy("fit", &[0.0], &[0.0], SeriesStyle::Dashed));
        let text: String = legend_line(&fig).spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("data"));
        assert!(text.contains("- - fit"));
    }
}
