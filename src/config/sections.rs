//! Tailing, layout, camera and UI sections
//!
//! Each section has a runtime struct with defaults and a `File*` twin with
//! all-optional fields for deserialization. `from_file()` merges the two and
//! sanitizes values that would break an invariant downstream.

use serde::Deserialize;
use std::time::Duration;

use crate::nav::FocusSettings;
use crate::panel::PanelLayout;

// ─────────────────────────────────────────────────────────────────────────────
// [tail]
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TailConfig {
    /// Sleep between polls when a file has no new data
    pub poll_interval_ms: u64,
    /// Panel capacity; oldest lines are evicted beyond this
    pub panel_max_lines: usize,
    /// Most channel events applied per frame
    pub drain_batch: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            panel_max_lines: 200,
            drain_batch: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTail {
    pub poll_interval_ms: Option<u64>,
    pub panel_max_lines: Option<usize>,
    pub drain_batch: Option<usize>,
}

impl TailConfig {
    pub fn from_file(file: Option<FileTail>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            poll_interval_ms: file.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            panel_max_lines: file.panel_max_lines.unwrap_or(defaults.panel_max_lines),
            drain_batch: file.drain_batch.unwrap_or(defaults.drain_batch),
        }
    }

    /// Zero values would stall followers or the drain; raise them to 1
    ///
    /// Each repair is described in `repairs`.
    pub fn sanitized(mut self, repairs: &mut Vec<String>) -> Self {
        if self.poll_interval_ms == 0 {
            repairs.push("tail.poll_interval_ms is 0, using 1".to_string());
            self.poll_interval_ms = 1;
        }
        for (name, value) in [
            ("tail.panel_max_lines", &mut self.panel_max_lines),
            ("tail.drain_batch", &mut self.drain_batch),
        ] {
            if *value == 0 {
                repairs.push(format!("{} is 0, using 1", name));
                *value = 1;
            }
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [layout]
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Distance between neighbouring panel centers
    pub panel_spacing: f32,
    /// Depth (y) of the panel row
    pub panel_depth: f32,
    /// Height (z) of panel centers
    pub panel_height: f32,
    /// Panel width in world units, used by the renderer
    pub panel_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let layout = PanelLayout::default();
        Self {
            panel_spacing: layout.spacing,
            panel_depth: layout.depth,
            panel_height: layout.height,
            panel_width: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLayout {
    pub panel_spacing: Option<f32>,
    pub panel_depth: Option<f32>,
    pub panel_height: Option<f32>,
    pub panel_width: Option<f32>,
}

impl LayoutConfig {
    pub fn from_file(file: Option<FileLayout>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let positive = |v: Option<f32>, d: f32| v.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(d);
        let finite = |v: Option<f32>, d: f32| v.filter(|v| v.is_finite()).unwrap_or(d);

        Self {
            panel_spacing: positive(file.panel_spacing, defaults.panel_spacing),
            panel_depth: finite(file.panel_depth, defaults.panel_depth),
            panel_height: finite(file.panel_height, defaults.panel_height),
            panel_width: positive(file.panel_width, defaults.panel_width),
        }
    }

    pub fn panel_layout(&self) -> PanelLayout {
        PanelLayout {
            spacing: self.panel_spacing,
            depth: self.panel_depth,
            height: self.panel_height,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [camera]
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub focus_distance: f32,
    pub focus_height: f32,
    /// Zoom-in multiplier, strictly between 0 and 1
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Higher is snappier
    pub lerp_speed: f32,
    pub move_speed: f32,
    pub boost_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let focus = FocusSettings::default();
        Self {
            focus_distance: focus.focus_distance,
            focus_height: focus.focus_height,
            zoom_step: focus.zoom_step,
            min_zoom: focus.min_zoom,
            max_zoom: focus.max_zoom,
            lerp_speed: 6.0,
            move_speed: 6.0,
            boost_speed: 14.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileCamera {
    pub focus_distance: Option<f32>,
    pub focus_height: Option<f32>,
    pub zoom_step: Option<f32>,
    pub min_zoom: Option<f32>,
    pub max_zoom: Option<f32>,
    pub lerp_speed: Option<f32>,
    pub move_speed: Option<f32>,
    pub boost_speed: Option<f32>,
}

impl CameraConfig {
    pub fn from_file(file: Option<FileCamera>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            focus_distance: file.focus_distance.unwrap_or(defaults.focus_distance),
            focus_height: file.focus_height.unwrap_or(defaults.focus_height),
            zoom_step: file.zoom_step.unwrap_or(defaults.zoom_step),
            min_zoom: file.min_zoom.unwrap_or(defaults.min_zoom),
            max_zoom: file.max_zoom.unwrap_or(defaults.max_zoom),
            lerp_speed: file.lerp_speed.unwrap_or(defaults.lerp_speed),
            move_speed: file.move_speed.unwrap_or(defaults.move_speed),
            boost_speed: file.boost_speed.unwrap_or(defaults.boost_speed),
        }
    }

    /// Repair values that would break zoom or smoothing
    ///
    /// A zoom step outside (0, 1) falls back to the default, inverted zoom
    /// bounds are swapped, and non-positive speeds fall back to defaults.
    /// Each repair is described in `repairs`; logging is not up yet when
    /// config loads, so the caller reports them later.
    pub fn sanitized(mut self, repairs: &mut Vec<String>) -> Self {
        let defaults = Self::default();

        if !(self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            repairs.push(format!(
                "camera.zoom_step {} outside (0, 1), using {}",
                self.zoom_step, defaults.zoom_step
            ));
            self.zoom_step = defaults.zoom_step;
        }
        for (name, value, default) in [
            ("camera.min_zoom", &mut self.min_zoom, defaults.min_zoom),
            ("camera.max_zoom", &mut self.max_zoom, defaults.max_zoom),
            (
                "camera.focus_distance",
                &mut self.focus_distance,
                defaults.focus_distance,
            ),
            ("camera.lerp_speed", &mut self.lerp_speed, defaults.lerp_speed),
            ("camera.move_speed", &mut self.move_speed, defaults.move_speed),
            ("camera.boost_speed", &mut self.boost_speed, defaults.boost_speed),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                repairs.push(format!("{} {} must be positive, using {}", name, value, default));
                *value = default;
            }
        }
        if self.min_zoom > self.max_zoom {
            repairs.push(format!(
                "camera.min_zoom {} above max_zoom {}, swapping",
                self.min_zoom, self.max_zoom
            ));
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        if !self.focus_height.is_finite() {
            repairs.push(format!(
                "camera.focus_height is not finite, using {}",
                defaults.focus_height
            ));
            self.focus_height = defaults.focus_height;
        }
        self
    }

    pub fn focus_settings(&self) -> FocusSettings {
        FocusSettings {
            focus_distance: self.focus_distance,
            focus_height: self.focus_height,
            zoom_step: self.zoom_step,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// [ui]
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    /// Frame interval of the terminal UI
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 33 }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileUi {
    pub tick_rate_ms: Option<u64>,
}

impl UiConfig {
    pub fn from_file(file: Option<FileUi>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            tick_rate_ms: file
                .tick_rate_ms
                .unwrap_or(Self::default().tick_rate_ms)
                .max(1),
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}
