use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Paragraph,
        canvas::{Canvas, Circle, Context, Rectangle},
    },
};

use super::interpolation::CellPoint;
use super::publisher::PixelPosition;
use super::ripple::RippleFrame;
use crate::game::{Phase, TickSnapshot};
use crate::metrics::GameMetrics;

/// Gap left around each drawn segment, in cells
const SEGMENT_INSET: f64 = 0.1;

/// Everything one frame draws from
pub struct FrameView<'a> {
    pub snapshot: &'a TickSnapshot,
    /// Interpolated segment positions, head first
    pub segments: &'a [CellPoint],
    pub head_px: PixelPosition,
    pub ripple: RippleFrame,
    pub cell_size: f32,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, view: &FrameView, metrics: &GameMetrics) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(view, metrics), chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        let width = view.snapshot.grid_width as f64;
        let height = view.snapshot.grid_height as f64;
        let border = match view.snapshot.phase {
            Phase::Running => Color::White,
            Phase::Paused => Color::Yellow,
            Phase::Dying { .. } => Color::Red,
        };
        let canvas = Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(border))
                    .title(format!(" Snake · {} ", view.snapshot.phase.label())),
            )
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| self.paint_board(ctx, view));
        frame.render_widget(canvas, game_area);

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn paint_board(&self, ctx: &mut Context, view: &FrameView) {
        let height = view.snapshot.grid_height as f64;
        // Grid rows grow downwards, canvas y grows upwards
        let to_canvas = |x: f64, y: f64| (x, height - y - 1.0);

        if let Some(food) = view.snapshot.food {
            let (x, y) = to_canvas(food.x as f64, food.y as f64);
            ctx.draw(&Circle {
                x: x + 0.5,
                y: y + 0.5,
                radius: 0.35,
                color: Color::Red,
            });
        }

        let body_color = if view.snapshot.phase.is_dying() {
            Color::DarkGray
        } else {
            Color::Green
        };
        for (i, seg) in view.segments.iter().enumerate().rev() {
            let (x, y) = to_canvas(seg.x as f64, seg.y as f64);
            ctx.draw(&Rectangle {
                x: x + SEGMENT_INSET,
                y: y + SEGMENT_INSET,
                width: 1.0 - 2.0 * SEGMENT_INSET,
                height: 1.0 - 2.0 * SEGMENT_INSET,
                color: if i == 0 { Color::Cyan } else { body_color },
            });
        }

        if view.ripple.intensity > 0.0 {
            let center = view.ripple.center.to_cell(view.cell_size);
            let (x, y) = to_canvas(center.x as f64, center.y as f64);
            ctx.draw(&Circle {
                x: x + 0.5,
                y: y + 0.5,
                radius: 0.5 + 3.0 * view.ripple.spread as f64,
                color: Color::LightBlue,
            });
        }

        ctx.layer();
        if let (Some(head), Some(heading)) = (view.segments.first(), view.snapshot.heading) {
            let (x, y) = to_canvas(head.x as f64, head.y as f64);
            ctx.print(
                x + 0.5,
                y + 0.5,
                Span::styled(
                    heading.glyph(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
            );
        }

        let banner = match view.snapshot.phase {
            Phase::Running => None,
            Phase::Paused => Some(("PAUSED", Color::Yellow)),
            Phase::Dying { .. } => Some(("CRASHED", Color::Red)),
        };
        if let Some((text, color)) = banner {
            ctx.print(
                view.snapshot.grid_width as f64 / 2.0 - text.len() as f64 / 4.0,
                height / 2.0,
                Span::styled(
                    text,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            );
        }
    }

    fn render_stats(&self, view: &FrameView, metrics: &GameMetrics) -> Paragraph<'_> {
        let heading = view.snapshot.heading.map_or("·", |h| h.glyph());
        let text = vec![Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                view.snapshot.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Best: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.best_score.to_string(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Head: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "{} ({:.0}, {:.0})px",
                    heading, view.head_px.x, view.head_px.y
                ),
                Style::default().fg(Color::White),
            ),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" to move | "),
            Span::styled("Space", Style::default().fg(Color::Yellow)),
            Span::raw(" to pause | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
