//! Focus navigation: which panel the camera is pointed at, and from how far
//!
//! ```text
//!   ┌────────────┐  sources configured   ┌──────────────┐
//!   │ Unfocused  │ ───────────────────▶  │ Focused(idx) │ ◀─┐ focus-* / zoom-*
//!   └────────────┘                       └──────────────┘ ──┘
//!   every action is a no-op
//! ```
//!
//! Panels sit on a single row, but directional navigation treats the source
//! list as a grid with `cols = max(1, floor(sqrt(n)))` columns. "Up" and
//! "down" therefore jump by `cols` positions along the row.

pub mod camera;
pub mod clock;

pub use camera::{CameraMode, CameraPose, CameraSmoother, Movement, Orientation, TargetPose};
pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::FixedStepClock;

use crate::geometry::Vec3;
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Grid indexing
// ─────────────────────────────────────────────────────────────────────────────

/// Synthetic column count for `n` sources
pub fn grid_columns(n: usize) -> usize {
    ((n as f64).sqrt().floor() as usize).max(1)
}

/// `(row, col)` of `index` in a grid of `n` sources
pub fn grid_cell(index: usize, n: usize) -> (usize, usize) {
    let cols = grid_columns(n);
    (index / cols, index % cols)
}

/// Inverse of [`grid_cell`]; `None` when the cell has no source
pub fn grid_index(row: usize, col: usize, n: usize) -> Option<usize> {
    let cols = grid_columns(n);
    if col >= cols {
        return None;
    }
    let index = row.checked_mul(cols)?.checked_add(col)?;
    (index < n).then_some(index)
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Named user actions; input backends dispatch by these names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FocusLeft,
    FocusRight,
    FocusUp,
    FocusDown,
    FocusFirst,
    FocusLast,
    ZoomIn,
    ZoomOut,
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Turn pointer look on or off
    ToggleMouseLook,
    Quit,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::FocusLeft,
        Action::FocusRight,
        Action::FocusUp,
        Action::FocusDown,
        Action::FocusFirst,
        Action::FocusLast,
        Action::ZoomIn,
        Action::ZoomOut,
        Action::MoveForward,
        Action::MoveBack,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveUp,
        Action::MoveDown,
        Action::ToggleMouseLook,
        Action::Quit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::FocusLeft => "focus-left",
            Action::FocusRight => "focus-right",
            Action::FocusUp => "focus-up",
            Action::FocusDown => "focus-down",
            Action::FocusFirst => "focus-first",
            Action::FocusLast => "focus-last",
            Action::ZoomIn => "zoom-in",
            Action::ZoomOut => "zoom-out",
            Action::MoveForward => "move-forward",
            Action::MoveBack => "move-back",
            Action::MoveLeft => "move-left",
            Action::MoveRight => "move-right",
            Action::MoveUp => "move-up",
            Action::MoveDown => "move-down",
            Action::ToggleMouseLook => "toggle-mouse-look",
            Action::Quit => "quit",
        }
    }

    /// Free-fly direction for movement actions
    pub fn movement(self) -> Option<Movement> {
        let (forward, right, up) = match self {
            Action::MoveForward => (1, 0, 0),
            Action::MoveBack => (-1, 0, 0),
            Action::MoveLeft => (0, -1, 0),
            Action::MoveRight => (0, 1, 0),
            Action::MoveUp => (0, 0, 1),
            Action::MoveDown => (0, 0, -1),
            _ => return None,
        };
        Some(Movement { forward, right, up })
    }

    /// Whether the navigator handles this action
    pub fn is_navigation(self) -> bool {
        !matches!(self, Action::Quit | Action::ToggleMouseLook) && self.movement().is_none()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an action name that does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigator
// ─────────────────────────────────────────────────────────────────────────────

/// Framing parameters for the focus target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusSettings {
    /// Camera distance in front of the focused panel at zoom 1.0
    pub focus_distance: f32,
    /// 20% of this is added to the camera height above the panel center
    pub focus_height: f32,
    /// Zoom-in multiplies by this, zoom-out divides
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            focus_distance: 6.5,
            focus_height: 1.8,
            zoom_step: 0.85,
            min_zoom: 0.3,
            max_zoom: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Unfocused,
    Focused(usize),
}

/// Focus/zoom state machine over fixed panel positions
#[derive(Debug, Clone)]
pub struct Navigator {
    positions: Vec<Vec3>,
    settings: FocusSettings,
    state: FocusState,
    zoom: f32,
    target: Option<TargetPose>,
}

impl Navigator {
    /// Starts focused on the first panel, or unfocused if there are none
    pub fn new(positions: Vec<Vec3>, settings: FocusSettings) -> Self {
        let state = if positions.is_empty() {
            FocusState::Unfocused
        } else {
            FocusState::Focused(0)
        };
        let mut nav = Self {
            positions,
            settings,
            state,
            zoom: 1.0_f32.clamp(settings.min_zoom, settings.max_zoom),
            target: None,
        };
        nav.retarget();
        nav
    }

    pub fn focus_index(&self) -> Option<usize> {
        match self.state {
            FocusState::Focused(index) => Some(index),
            FocusState::Unfocused => None,
        }
    }

    pub fn source_count(&self) -> usize {
        self.positions.len()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Pose the camera should converge to, if anything is focused
    pub fn target(&self) -> Option<&TargetPose> {
        self.target.as_ref()
    }

    /// Run the transition for `action`
    ///
    /// Returns whether the focus or zoom changed. Anything that is not
    /// [`Action::is_navigation`] returns false.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::FocusLeft => self.focus_left(),
            Action::FocusRight => self.focus_right(),
            Action::FocusUp => self.focus_up(),
            Action::FocusDown => self.focus_down(),
            Action::FocusFirst => self.focus_first(),
            Action::FocusLast => self.focus_last(),
            Action::ZoomIn => self.zoom_in(),
            Action::ZoomOut => self.zoom_out(),
            _ => false,
        }
    }

    pub fn focus_left(&mut self) -> bool {
        self.move_in_row(|col, _| col.saturating_sub(1))
    }

    pub fn focus_right(&mut self) -> bool {
        self.move_in_row(|col, cols| (col + 1).min(cols - 1))
    }

    pub fn focus_up(&mut self) -> bool {
        let Some(index) = self.focus_index() else {
            return false;
        };
        let cols = grid_columns(self.source_count());
        self.focus_on(index.saturating_sub(cols))
    }

    pub fn focus_down(&mut self) -> bool {
        let Some(index) = self.focus_index() else {
            return false;
        };
        let n = self.source_count();
        self.focus_on((index + grid_columns(n)).min(n - 1))
    }

    pub fn focus_first(&mut self) -> bool {
        if self.focus_index().is_none() {
            return false;
        }
        self.focus_on(0)
    }

    pub fn focus_last(&mut self) -> bool {
        if self.focus_index().is_none() {
            return false;
        }
        self.focus_on(self.source_count() - 1)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom * self.settings.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom / self.settings.zoom_step)
    }

    /// Shared left/right handler: adjust the column, keep the row
    fn move_in_row(&mut self, adjust: impl Fn(usize, usize) -> usize) -> bool {
        let Some(index) = self.focus_index() else {
            return false;
        };
        let n = self.source_count();
        let cols = grid_columns(n);
        let (row, col) = grid_cell(index, n);
        match grid_index(row, adjust(col, cols), n) {
            Some(next) => self.focus_on(next),
            // Short last row: the neighbouring cell has no source
            None => false,
        }
    }

    fn focus_on(&mut self, index: usize) -> bool {
        if index >= self.source_count() || self.state == FocusState::Focused(index) {
            return false;
        }
        tracing::debug!("Focus moved to panel {}", index);
        self.state = FocusState::Focused(index);
        self.retarget();
        true
    }

    fn set_zoom(&mut self, zoom: f32) -> bool {
        if self.state == FocusState::Unfocused {
            return false;
        }
        let zoom = zoom.clamp(self.settings.min_zoom, self.settings.max_zoom);
        if zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        self.retarget();
        true
    }

    fn retarget(&mut self) {
        self.target = self.focus_index().map(|index| {
            let panel = self.positions[index];
            let distance = self.settings.focus_distance * self.zoom;
            TargetPose {
                position: panel + Vec3::new(0.0, -distance, self.settings.focus_height * 0.2),
                look_at: panel + Vec3::new(0.0, 0.0, 0.2),
            }
        });
    }
}
