// Terminal render backend
//
// Keeps the latest state pushed by the scene (panel text, camera pose) so
// the draw pass can render it at its own pace.

use crate::geometry::Vec3;
use crate::nav::{CameraPose, Orientation};
use crate::scene::{PanelHandle, RenderBackend};
use std::path::PathBuf;

/// What the terminal knows about one panel
#[derive(Debug, Clone, Default)]
pub struct PanelView {
    pub title: String,
    pub position: Vec3,
    pub lines: Vec<String>,
}

pub struct TerminalBackend {
    panels: Vec<PanelView>,
    pose: CameraPose,
    panel_width: f32,
}

impl TerminalBackend {
    /// `font` is only reported: terminals draw with their own font
    pub fn new(panel_width: f32, font: Option<PathBuf>) -> Self {
        if let Some(font) = font {
            tracing::info!("Ignoring font {} in terminal renderer", font.display());
        }
        Self {
            panels: Vec::new(),
            pose: CameraPose::default(),
            panel_width,
        }
    }

    pub fn panels(&self) -> &[PanelView] {
        &self.panels
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn panel_width(&self) -> f32 {
        self.panel_width
    }
}

impl RenderBackend for TerminalBackend {
    fn create_panel(&mut self, title: &str, position: Vec3) -> PanelHandle {
        self.panels.push(PanelView {
            title: title.to_string(),
            position,
            lines: Vec::new(),
        });
        PanelHandle(self.panels.len() - 1)
    }

    fn set_panel_text<'a, I>(&mut self, panel: PanelHandle, lines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(view) = self.panels.get_mut(panel.0) {
            view.lines.clear();
            view.lines.extend(lines.into_iter().map(str::to_string));
        }
    }

    fn set_camera_pose(&mut self, position: Vec3, orientation: Orientation) {
        self.pose = CameraPose {
            position,
            orientation,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_replaces_previous() {
        let mut backend = TerminalBackend::new(8.0, None);
        let handle = backend.create_panel("app.log", Vec3::ZERO);
        backend.set_panel_text(handle, ["a", "b"]);
        backend.set_panel_text(handle, ["b", "c"]);
        assert_eq!(backend.panels()[0].lines, vec!["b", "c"]);
    }

    #[test]
    fn test_unknown_handle_is_ignored() {
        let mut backend = TerminalBackend::new(8.0, Some(PathBuf::from("mono.ttf")));
        backend.set_panel_text(PanelHandle(4), ["x"]);
        assert!(backend.panels().is_empty());
    }
}
