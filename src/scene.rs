//! Per-tick glue between the core and a render backend
//!
//! Each tick the scene drains a bounded batch from the aggregation channel
//! into the panel store, steps the camera smoother with the clock's `dt`,
//! and pushes what changed to the backend. User input arrives as named
//! [`Action`]s through [`Scene::dispatch`], and as pointer turns through
//! [`Scene::look`].

use crate::events::{EventReceiver, SourceId};
use crate::geometry::Vec3;
use crate::nav::{
    Action, CameraMode, CameraPose, CameraSmoother, Clock, Navigator, Orientation,
};
use crate::panel::PanelStore;
use std::time::Duration;

/// Opaque id a backend hands out for each created panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelHandle(pub usize);

/// Everything the core needs from whatever draws the scene
pub trait RenderBackend {
    fn create_panel(&mut self, title: &str, position: Vec3) -> PanelHandle;

    /// Replace a panel's visible text, oldest line first
    fn set_panel_text<'a, I>(&mut self, panel: PanelHandle, lines: I)
    where
        I: IntoIterator<Item = &'a str>;

    fn set_camera_pose(&mut self, position: Vec3, orientation: Orientation);
}

/// Tuning for the per-tick loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    /// Most events applied from the channel per tick
    pub drain_batch: usize,
    /// Free-fly speed, units per second
    pub move_speed: f32,
    /// Free-fly speed while boosted
    pub boost_speed: f32,
    /// How long one movement action moves the camera for
    pub move_step: Duration,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            drain_batch: 1000,
            move_speed: 6.0,
            boost_speed: 14.0,
            move_step: Duration::from_millis(33),
        }
    }
}

/// Whether the frame loop should keep going after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub drained: usize,
    pub panels_updated: usize,
}

/// Status bar summary
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStatus {
    pub focused_title: Option<String>,
    pub focus_index: Option<usize>,
    pub source_count: usize,
    pub zoom: f32,
    pub total_lines: u64,
    pub free_camera: bool,
    /// Pointer motion turns the camera
    pub mouse_look: bool,
}

/// Camera start: slightly above the origin, looking down +y
pub fn initial_pose() -> CameraPose {
    CameraPose {
        position: Vec3::new(0.0, 0.0, 1.5),
        orientation: Orientation::default(),
    }
}

pub struct Scene<B: RenderBackend> {
    store: PanelStore,
    navigator: Navigator,
    smoother: CameraSmoother,
    rx: EventReceiver,
    backend: B,
    handles: Vec<PanelHandle>,
    settings: SceneSettings,
    mouse_look: bool,
}

impl<B: RenderBackend> Scene<B> {
    /// Registers every panel with the backend and publishes the start pose
    pub fn new(
        store: PanelStore,
        navigator: Navigator,
        smoother: CameraSmoother,
        rx: EventReceiver,
        mut backend: B,
        settings: SceneSettings,
    ) -> Self {
        let handles = store
            .iter()
            .map(|panel| backend.create_panel(panel.title(), panel.position()))
            .collect();
        let pose = smoother.pose();
        backend.set_camera_pose(pose.position, pose.orientation);

        Self {
            store,
            navigator,
            smoother,
            rx,
            backend,
            handles,
            settings,
            mouse_look: false,
        }
    }

    /// One frame: drain, smooth, publish
    pub fn tick(&mut self, clock: &mut impl Clock) -> TickReport {
        let dt = clock.delta();
        let drained = self.store.drain(&mut self.rx, self.settings.drain_batch);

        let mut panels_updated = 0;
        for (panel, handle) in self.store.iter_mut().zip(&self.handles) {
            if panel.take_dirty() {
                self.backend.set_panel_text(*handle, panel.lines());
                panels_updated += 1;
            }
        }

        let pose = self.smoother.step(self.navigator.target(), dt);
        self.backend.set_camera_pose(pose.position, pose.orientation);

        TickReport {
            drained,
            panels_updated,
        }
    }

    /// Route a named action; `boosted` only matters for movement
    pub fn dispatch(&mut self, action: Action, boosted: bool) -> Flow {
        if action == Action::Quit {
            return Flow::Quit;
        }
        if action == Action::ToggleMouseLook {
            self.mouse_look = !self.mouse_look;
            tracing::debug!("Mouse look {}", if self.mouse_look { "on" } else { "off" });
            return Flow::Continue;
        }

        if let Some(movement) = action.movement() {
            let speed = if boosted {
                self.settings.boost_speed
            } else {
                self.settings.move_speed
            };
            self.smoother.fly(movement, speed, self.settings.move_step);
            self.publish_pose();
        } else if action.is_navigation() {
            // Focus and zoom always hand the camera back to the navigator
            self.navigator.apply(action);
            self.smoother.attach();
        }
        Flow::Continue
    }

    /// Turn the camera by hand, in degrees; detaches it like flying does
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.smoother.look(dx, dy);
        self.publish_pose();
    }

    /// Whether pointer motion should turn the camera
    pub fn mouse_look(&self) -> bool {
        self.mouse_look
    }

    fn publish_pose(&mut self) {
        let pose = self.smoother.pose();
        self.backend.set_camera_pose(pose.position, pose.orientation);
    }

    pub fn status(&self) -> SceneStatus {
        let focus_index = self.navigator.focus_index();
        SceneStatus {
            focused_title: focus_index
                .and_then(|i| self.store.get(SourceId(i)))
                .map(|panel| panel.title().to_string()),
            focus_index,
            source_count: self.store.len(),
            zoom: self.navigator.zoom(),
            total_lines: self.store.total_appended(),
            free_camera: self.smoother.mode() == CameraMode::Free,
            mouse_look: self.mouse_look,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{self, LogEvent};
    use crate::nav::{FixedStepClock, FocusSettings};
    use crate::panel::PanelLayout;
    use std::path::PathBuf;

    /// Backend that records every call
    #[derive(Default)]
    struct Recorder {
        panels: Vec<(String, Vec3)>,
        texts: Vec<(PanelHandle, Vec<String>)>,
        poses: Vec<(Vec3, Orientation)>,
    }

    impl RenderBackend for Recorder {
        fn create_panel(&mut self, title: &str, position: Vec3) -> PanelHandle {
            self.panels.push((title.to_string(), position));
            PanelHandle(self.panels.len() - 1)
        }

        fn set_panel_text<'a, I>(&mut self, panel: PanelHandle, lines: I)
        where
            I: IntoIterator<Item = &'a str>,
        {
            self.texts
                .push((panel, lines.into_iter().map(str::to_string).collect()));
        }

        fn set_camera_pose(&mut self, position: Vec3, orientation: Orientation) {
            self.poses.push((position, orientation));
        }
    }

    fn scene(n: usize) -> (Scene<Recorder>, events::EventSender) {
        let paths: Vec<PathBuf> = (0..n)
            .map(|i| PathBuf::from(format!("/logs/{}.log", i)))
            .collect();
        let layout = PanelLayout::default();
        let store = PanelStore::new(&paths, &layout, 5);
        let navigator = Navigator::new(store.positions(), FocusSettings::default());
        let smoother = CameraSmoother::new(initial_pose(), 6.0);
        let (tx, rx) = events::channel();
        let scene = Scene::new(
            store,
            navigator,
            smoother,
            rx,
            Recorder::default(),
            SceneSettings {
                drain_batch: 3,
                ..Default::default()
            },
        );
        (scene, tx)
    }

    #[test]
    fn test_panels_registered_in_source_order() {
        let (scene, _tx) = scene(3);
        let titles: Vec<&str> = scene.backend().panels.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(titles, vec!["0.log", "1.log", "2.log"]);
        assert_eq!(scene.backend().poses.len(), 1);
    }

    #[test]
    fn test_tick_drains_bounded_batch_and_pushes_dirty_panels() {
        let (mut scene, tx) = scene(2);
        let mut clock = FixedStepClock::from_secs_f32(0.016);
        for i in 0..4 {
            tx.send(LogEvent::new(SourceId(1), format!("line {}", i))).unwrap();
        }

        let report = scene.tick(&mut clock);
        assert_eq!(report.drained, 3);
        assert_eq!(report.panels_updated, 1);
        let (handle, lines) = scene.backend().texts.last().unwrap();
        assert_eq!(*handle, PanelHandle(1));
        assert_eq!(lines, &vec!["line 0", "line 1", "line 2"]);

        let report = scene.tick(&mut clock);
        assert_eq!(report.drained, 1);

        // Nothing new: no text updates
        let before = scene.backend().texts.len();
        let report = scene.tick(&mut clock);
        assert_eq!(report.panels_updated, 0);
        assert_eq!(scene.backend().texts.len(), before);
        assert_eq!(scene.status().total_lines, 4);
    }

    #[test]
    fn test_camera_converges_on_focused_panel() {
        let (mut scene, _tx) = scene(3);
        let mut clock = FixedStepClock::from_secs_f32(0.05);
        scene.dispatch(Action::FocusLast, false);

        for _ in 0..200 {
            scene.tick(&mut clock);
        }
        let target = *scene.navigator.target().unwrap();
        assert!((scene.smoother.pose().position - target.position).length() < 1e-3);
        assert_eq!(scene.status().focused_title.as_deref(), Some("2.log"));
    }

    #[test]
    fn test_movement_detaches_and_focus_reattaches() {
        let (mut scene, _tx) = scene(2);
        let mut clock = FixedStepClock::from_secs_f32(0.05);

        assert_eq!(scene.dispatch(Action::MoveUp, true), Flow::Continue);
        assert!(scene.status().free_camera);
        let held = scene.smoother.pose();
        scene.tick(&mut clock);
        assert_eq!(scene.smoother.pose(), held);

        scene.dispatch(Action::ZoomIn, false);
        assert!(!scene.status().free_camera);
        scene.tick(&mut clock);
        assert_ne!(scene.smoother.pose(), held);
    }

    #[test]
    fn test_look_publishes_and_focus_reattaches() {
        let (mut scene, _tx) = scene(2);
        let published = scene.backend().poses.len();

        scene.look(30.0, 10.0);
        assert!(scene.status().free_camera);
        assert_eq!(scene.backend().poses.len(), published + 1);
        let (_, orientation) = *scene.backend().poses.last().unwrap();
        assert!((orientation.heading + 30.0).abs() < 1e-3);
        assert!((orientation.pitch + 10.0).abs() < 1e-3);

        scene.dispatch(Action::FocusRight, false);
        assert!(!scene.status().free_camera);
    }

    #[test]
    fn test_toggle_mouse_look_leaves_camera_alone() {
        let (mut scene, _tx) = scene(2);
        assert!(!scene.status().mouse_look);
        let target = scene.navigator.target().copied();

        assert_eq!(scene.dispatch(Action::ToggleMouseLook, false), Flow::Continue);
        assert!(scene.mouse_look());
        assert!(scene.status().mouse_look);
        assert_eq!(scene.navigator.target().copied(), target);
        assert!(!scene.status().free_camera);

        scene.dispatch(Action::ToggleMouseLook, false);
        assert!(!scene.mouse_look());
    }

    #[test]
    fn test_quit_action() {
        let (mut scene, _tx) = scene(1);
        assert_eq!(scene.dispatch(Action::Quit, false), Flow::Quit);
    }

    #[test]
    fn test_empty_scene_ticks_safely() {
        let (mut scene, _tx) = scene(0);
        let mut clock = FixedStepClock::from_secs_f32(0.1);
        let start = scene.smoother.pose();
        scene.dispatch(Action::FocusRight, false);
        scene.tick(&mut clock);
        assert_eq!(scene.smoother.pose(), start);
        assert_eq!(scene.status().focus_index, None);
    }
}
