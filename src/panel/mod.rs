//! Panel store - one bounded line buffer per source
//!
//! Panels are created once at startup, each with a fixed slot on the panel
//! row, and are never removed. The frame loop is the only writer: it drains
//! the aggregation channel each tick (see [`PanelStore::drain`]) and appends
//! every line to the panel of its source.

use crate::events::{EventReceiver, SourceId};
use crate::geometry::Vec3;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Spatial layout of the panel row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// Distance between neighbouring panel centers along x
    pub spacing: f32,
    /// Constant y of every panel
    pub depth: f32,
    /// Constant z of every panel center
    pub height: f32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            spacing: 8.5,
            depth: 5.0,
            height: 1.8,
        }
    }
}

/// Slot positions for `n` panels on a single row centered on the origin
///
/// Slot `i` sits at `x = (i - (n-1)/2) * spacing`. Navigation still treats
/// the sources as a synthetic 2-D grid, so "up" and "down" jump along this
/// row rather than to a panel spatially above or below.
pub fn grid_positions(n: usize, layout: &PanelLayout) -> Vec<Vec3> {
    if n == 0 {
        return Vec::new();
    }
    let center = (n - 1) as f32 / 2.0;
    (0..n)
        .map(|i| {
            Vec3::new(
                (i as f32 - center) * layout.spacing,
                layout.depth,
                layout.height,
            )
        })
        .collect()
}

/// Panel title shown in its header: the file name of the path
pub fn display_title(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Bounded FIFO of the most recent lines of one source
#[derive(Debug, Clone)]
pub struct Panel {
    title: String,
    position: Vec3,
    lines: VecDeque<String>,
    capacity: usize,
    appended: u64,
    dirty: bool,
}

impl Panel {
    /// `capacity` is clamped to at least one line
    pub fn new(path: &Path, position: Vec3, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            title: display_title(path),
            position,
            lines: VecDeque::with_capacity(capacity),
            capacity,
            appended: 0,
            dirty: false,
        }
    }

    /// Append a line, evicting the oldest one when full
    pub fn push_line(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.appended += 1;
        self.dirty = true;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Lines oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Total lines ever appended, including evicted ones
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Whether lines arrived since the last call; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// All panels, indexed by source
#[derive(Debug, Default)]
pub struct PanelStore {
    panels: Vec<Panel>,
}

impl PanelStore {
    /// One panel per path; path `i` becomes `SourceId(i)` in slot `i`
    pub fn new(paths: &[PathBuf], layout: &PanelLayout, capacity: usize) -> Self {
        let positions = grid_positions(paths.len(), layout);
        let panels = paths
            .iter()
            .zip(positions)
            .map(|(path, position)| Panel::new(path, position, capacity))
            .collect();
        Self { panels }
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn get(&self, source: SourceId) -> Option<&Panel> {
        self.panels.get(source.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> + '_ {
        self.panels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Panel> + '_ {
        self.panels.iter_mut()
    }

    /// Fixed slot positions, in source order
    pub fn positions(&self) -> Vec<Vec3> {
        self.panels.iter().map(Panel::position).collect()
    }

    /// Append a line to a source's panel; unknown sources are ignored
    pub fn append(&mut self, source: SourceId, line: String) -> bool {
        match self.panels.get_mut(source.index()) {
            Some(panel) => {
                panel.push_line(line);
                true
            }
            None => false,
        }
    }

    /// Aggregation consumer: apply at most `max` pending events
    ///
    /// Never waits; if fewer than `max` events are queued it applies what is
    /// there and returns. Returns how many events were taken off the channel,
    /// including ones for unknown sources (which are dropped).
    pub fn drain(&mut self, rx: &mut EventReceiver, max: usize) -> usize {
        let mut processed = 0;
        while processed < max {
            let Ok(event) = rx.try_recv() else {
                break;
            };
            if !self.append(event.source, event.text) {
                tracing::trace!("Dropping line for unknown source {}", event.source);
            }
            processed += 1;
        }
        processed
    }

    /// Total lines appended across all panels
    pub fn total_appended(&self) -> u64 {
        self.panels.iter().map(Panel::appended).sum()
    }
}
