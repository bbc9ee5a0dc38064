//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the full config as a commented TOML document
    pub fn to_toml(&self) -> String {
        format!(
            r#"# logwall configuration
#
# Environment overrides: LOGWALL_POLL_MS, LOGWALL_MAX_LINES, LOGWALL_LOG_LEVEL

# Following and buffering
[tail]
# Sleep between polls when a file has no new data
poll_interval_ms = {poll}
# Lines kept per panel (oldest evicted first)
panel_max_lines = {max_lines}
# Most lines applied to panels per frame
drain_batch = {drain}

# Panel row geometry (world units)
[layout]
panel_spacing = {spacing:?}
panel_depth = {depth:?}
panel_height = {height:?}
panel_width = {width:?}

# Focus framing and camera motion
[camera]
focus_distance = {focus_distance:?}
focus_height = {focus_height:?}
# Zoom-in multiplies the focus distance by this (0 < step < 1)
zoom_step = {zoom_step:?}
min_zoom = {min_zoom:?}
max_zoom = {max_zoom:?}
# Higher is snappier
lerp_speed = {lerp:?}
# Free-fly speeds (WASD), units per second
move_speed = {move_speed:?}
boost_speed = {boost_speed:?}

[ui]
tick_rate_ms = {tick}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging, in addition to the in-app log buffer
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            poll = self.tail.poll_interval_ms,
            max_lines = self.tail.panel_max_lines,
            drain = self.tail.drain_batch,
            spacing = self.layout.panel_spacing,
            depth = self.layout.panel_depth,
            height = self.layout.panel_height,
            width = self.layout.panel_width,
            focus_distance = self.camera.focus_distance,
            focus_height = self.camera.focus_height,
            zoom_step = self.camera.zoom_step,
            min_zoom = self.camera.min_zoom,
            max_zoom = self.camera.max_zoom,
            lerp = self.camera.lerp_speed,
            move_speed = self.camera.move_speed,
            boost_speed = self.camera.boost_speed,
            tick = self.ui.tick_rate_ms,
            log_level = escape(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = escape(&self.logging.file_dir.display().to_string()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = escape(&self.logging.file_prefix),
        )
    }
}

/// Escape a value for a basic TOML string
///
/// Control characters are not allowed raw inside basic strings.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}
