// UI rendering - panel wall and status bar
//
// Panels are drawn back to front so nearer ones overlap farther ones.

use super::backend::{PanelView, TerminalBackend};
use super::projection::{self, Projected};
use crate::logging::LogEntry;
use crate::scene::SceneStatus;
use crate::tail::MetricsSnapshot;
use crate::util::{fit_to_width, format_compact_number};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Everything the status bar shows
pub struct StatusInfo<'a> {
    pub scene: &'a SceneStatus,
    pub workers: MetricsSnapshot,
    pub last_log: Option<&'a LogEntry>,
}

pub fn draw(f: &mut Frame, backend: &TerminalBackend, status: &StatusInfo<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(f.area());

    draw_wall(f, chunks[0], backend, status.scene.focus_index);
    draw_status_bar(f, chunks[1], status);
}

/// Visible panels with their screen spans, farthest first
pub fn visible_panels(backend: &TerminalBackend, area_width: u16) -> Vec<(usize, Projected, u16, u16)> {
    let pose = backend.pose();
    let mut visible: Vec<_> = backend
        .panels()
        .iter()
        .enumerate()
        .filter_map(|(index, panel)| {
            let projected = projection::project(&pose, panel.position, backend.panel_width())?;
            let (x, width) = projection::columns(&projected, area_width)?;
            Some((index, projected, x, width))
        })
        .collect();
    visible.sort_by(|a, b| b.1.depth.total_cmp(&a.1.depth));
    visible
}

fn draw_wall(f: &mut Frame, area: Rect, backend: &TerminalBackend, focus: Option<usize>) {
    for (index, _, x, width) in visible_panels(backend, area.width) {
        let rect = Rect {
            x: area.x + x,
            y: area.y,
            width,
            height: area.height,
        };
        draw_panel(f, rect, &backend.panels()[index], focus == Some(index));
    }
}

fn draw_panel(f: &mut Frame, area: Rect, panel: &PanelView, focused: bool) {
    let (border, title_style) = if focused {
        (
            Style::default().fg(Color::Yellow),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Gray),
        )
    };

    let inner_width = usize::from(area.width.saturating_sub(2));
    let inner_height = usize::from(area.height.saturating_sub(2));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(fit_to_width(&panel.title, inner_width), title_style));

    // Newest lines at the bottom, like tail -f
    let start = panel.lines.len().saturating_sub(inner_height);
    let lines: Vec<Line> = panel.lines[start..]
        .iter()
        .map(|line| Line::from(styled_line(line, inner_width)))
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Diagnostic lines stand out in red
fn styled_line(line: &str, width: usize) -> Span<'static> {
    let text = fit_to_width(line, width);
    if line.starts_with("[ERROR") {
        Span::styled(text, Style::default().fg(Color::Red))
    } else {
        Span::raw(text)
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, status: &StatusInfo<'_>) {
    let scene = status.scene;

    let focus = match (&scene.focused_title, scene.focus_index) {
        (Some(title), Some(index)) => format!("{} [{}/{}]", title, index + 1, scene.source_count),
        _ => "no sources".to_string(),
    };
    let camera = match (scene.free_camera, scene.mouse_look) {
        (_, true) => " │ mouse look",
        (true, false) => " │ free cam",
        (false, false) => "",
    };

    let mut text = format!(
        " {} │ zoom {:.2}{} │ {} lines",
        focus,
        scene.zoom,
        camera,
        format_compact_number(scene.total_lines),
    );
    text.push_str(&worker_summary(&status.workers));
    if let Some(entry) = status.last_log {
        text.push_str(&format!(
            " │ {} {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.level.as_str(),
            entry.message
        ));
    }

    let status_bar = Paragraph::new(fit_to_width(&text, usize::from(area.width)))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::TOP));

    f.render_widget(status_bar, area);
}

/// Follower health, only once something has happened
///
/// ↻ rotations, ✂ truncations, ⟳ reopens after a failed open, ✕ followers
/// that have stopped.
fn worker_summary(workers: &MetricsSnapshot) -> String {
    let counters = [
        ('↻', workers.rotations),
        ('✂', workers.truncations),
        ('⟳', workers.reopens),
        ('✕', workers.finished_workers),
    ];
    let parts: Vec<String> = counters
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(symbol, n)| format!("{}{}", symbol, n))
        .collect();
    if parts.is_empty() {
        return String::new();
    }
    format!(" │ {}", parts.join(" "))
}
