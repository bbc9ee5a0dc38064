// Input handling: key table and repeat behavior
//
// Keys are translated to named actions through one table. Each binding also
// carries a KeyBehavior:
// - State-change keys (trigger once per press)
// - Repeatable keys (trigger on press, then repeat while held)
// - Continuous keys (trigger on every event, for free-fly movement)
//
// The mouse wheel zooms. Dragging with the left button always turns the
// camera; plain pointer motion turns it only while mouse look is on.

use crate::nav::Action;
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Gap after which a repeated press counts as a new press
///
/// Most terminals never send release events, so a held key and a quick
/// second tap look the same; silence longer than this means "released".
const RELEASE_GAP: Duration = Duration::from_millis(150);

/// Degrees of turn per terminal cell of pointer travel
///
/// Cells are roughly twice as tall as wide, so a row turns twice as far.
const LOOK_DEGREES_PER_COLUMN: f32 = 1.5;
const LOOK_DEGREES_PER_ROW: f32 = 3.0;

/// Defines how a key should behave when pressed/held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBehavior {
    /// Trigger only once per press
    StateChange,

    /// Trigger on press, then repeat after initial delay
    Repeatable {
        /// Delay before starting to repeat
        initial_delay: Duration,
        /// Time between repeats
        repeat_interval: Duration,
    },

    /// Trigger on every key event
    Continuous,
}

impl KeyBehavior {
    /// Focus navigation: a deliberate step, slow repeat
    pub fn navigation() -> Self {
        Self::Repeatable {
            initial_delay: Duration::from_millis(400),
            repeat_interval: Duration::from_millis(120),
        }
    }

    /// Zoom: faster repeat
    pub fn fast_navigation() -> Self {
        Self::Repeatable {
            initial_delay: Duration::from_millis(250),
            repeat_interval: Duration::from_millis(50),
        }
    }
}

/// Tracks the state of a single key
#[derive(Debug, Default)]
struct KeyState {
    /// When the current press started
    press_started: Option<Instant>,
    /// When the action was last triggered
    last_triggered: Option<Instant>,
    /// Last event of any kind for this key
    last_seen: Option<Instant>,
}

impl KeyState {
    fn release(&mut self) {
        *self = Self::default();
    }
}

/// One entry of the key table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub action: Action,
    pub behavior: KeyBehavior,
}

/// Resolved input: which action, and whether shift boosts it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub action: Action,
    pub boosted: bool,
}

/// Key table plus per-key repeat state
pub struct InputHandler {
    bindings: HashMap<KeyCode, Binding>,
    key_states: HashMap<KeyCode, KeyState>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            key_states: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: KeyCode, action: Action, behavior: KeyBehavior) {
        self.bindings.insert(key, Binding { action, behavior });
    }

    pub fn bind_keys(&mut self, keys: &[KeyCode], action: Action, behavior: KeyBehavior) {
        for key in keys {
            self.bind(*key, action, behavior);
        }
    }

    pub fn binding(&self, key: KeyCode) -> Option<Binding> {
        self.bindings.get(&key).copied()
    }

    /// The standard key table
    pub fn with_default_bindings() -> Self {
        let mut handler = Self::new();
        let nav = KeyBehavior::navigation();
        let fast = KeyBehavior::fast_navigation();

        // Focus
        handler.bind(KeyCode::Left, Action::FocusLeft, nav);
        handler.bind(KeyCode::Right, Action::FocusRight, nav);
        handler.bind(KeyCode::Up, Action::FocusUp, nav);
        handler.bind(KeyCode::Down, Action::FocusDown, nav);
        handler.bind(KeyCode::Home, Action::FocusFirst, KeyBehavior::StateChange);
        handler.bind(KeyCode::End, Action::FocusLast, KeyBehavior::StateChange);

        // Zoom ('=' is unshifted '+' on most layouts)
        handler.bind_keys(
            &[KeyCode::Char('+'), KeyCode::Char('=')],
            Action::ZoomIn,
            fast,
        );
        handler.bind(KeyCode::Char('-'), Action::ZoomOut, fast);

        // Free-fly
        let go = KeyBehavior::Continuous;
        handler.bind(KeyCode::Char('w'), Action::MoveForward, go);
        handler.bind(KeyCode::Char('s'), Action::MoveBack, go);
        handler.bind(KeyCode::Char('a'), Action::MoveLeft, go);
        handler.bind(KeyCode::Char('d'), Action::MoveRight, go);
        handler.bind(KeyCode::Char(' '), Action::MoveUp, go);
        handler.bind(KeyCode::Char('c'), Action::MoveDown, go);

        handler.bind(KeyCode::Esc, Action::ToggleMouseLook, KeyBehavior::StateChange);
        handler.bind(KeyCode::Char('q'), Action::Quit, KeyBehavior::StateChange);

        handler
    }

    /// Translate a key press into a command, applying repeat behavior
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<Command> {
        self.handle_key_at(event, Instant::now())
    }

    fn handle_key_at(&mut self, event: KeyEvent, now: Instant) -> Option<Command> {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(Command {
                action: Action::Quit,
                boosted: false,
            });
        }

        // Shifted letters arrive uppercase; look them up lowercase
        let (code, shifted) = match event.code {
            KeyCode::Char(ch) if ch.is_ascii_uppercase() => {
                (KeyCode::Char(ch.to_ascii_lowercase()), true)
            }
            other => (other, event.modifiers.contains(KeyModifiers::SHIFT)),
        };

        let binding = self.binding(code)?;
        if !self.should_trigger(code, binding.behavior, now) {
            return None;
        }
        Some(Command {
            action: binding.action,
            boosted: shifted,
        })
    }

    fn should_trigger(&mut self, key: KeyCode, behavior: KeyBehavior, now: Instant) -> bool {
        let state = self.key_states.entry(key).or_default();

        // Long silence: the key was released even if we never heard about it
        if let Some(seen) = state.last_seen {
            if now.duration_since(seen) > RELEASE_GAP {
                state.release();
            }
        }
        state.last_seen = Some(now);

        let Some(press_start) = state.press_started else {
            // New key press - always trigger
            state.press_started = Some(now);
            state.last_triggered = Some(now);
            return true;
        };

        match behavior {
            KeyBehavior::Continuous => {
                state.last_triggered = Some(now);
                true
            }
            KeyBehavior::StateChange => false,
            KeyBehavior::Repeatable {
                initial_delay,
                repeat_interval,
            } => {
                let since_last = state
                    .last_triggered
                    .map_or(repeat_interval, |last| now.duration_since(last));
                if now.duration_since(press_start) >= initial_delay
                    && since_last >= repeat_interval
                {
                    state.last_triggered = Some(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Explicit release, for terminals that report it
    pub fn handle_key_release(&mut self, key: KeyCode) {
        let key = match key {
            KeyCode::Char(ch) => KeyCode::Char(ch.to_ascii_lowercase()),
            other => other,
        };
        if let Some(state) = self.key_states.get_mut(&key) {
            state.release();
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::with_default_bindings()
    }
}

/// What a mouse event asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseInput {
    Action(Action),
    /// Turn `dx` degrees right and `dy` degrees down
    Look { dx: f32, dy: f32 },
}

/// Turns pointer positions into look deltas
///
/// Terminals report absolute cells, so each delta is measured from the
/// previous event of any kind.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<(u16, u16)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one mouse event; `captured` is whether mouse look is on
    pub fn handle(&mut self, event: MouseEvent, captured: bool) -> Option<MouseInput> {
        let here = (event.column, event.row);
        let previous = self.last.replace(here);

        match event.kind {
            MouseEventKind::ScrollUp => Some(MouseInput::Action(Action::ZoomIn)),
            MouseEventKind::ScrollDown => Some(MouseInput::Action(Action::ZoomOut)),
            MouseEventKind::Drag(MouseButton::Left) => look_delta(previous?, here),
            MouseEventKind::Moved if captured => look_delta(previous?, here),
            _ => None,
        }
    }
}

fn look_delta(from: (u16, u16), to: (u16, u16)) -> Option<MouseInput> {
    let columns = f32::from(to.0) - f32::from(from.0);
    let rows = f32::from(to.1) - f32::from(from.1);
    if columns == 0.0 && rows == 0.0 {
        return None;
    }
    Some(MouseInput::Look {
        dx: columns * LOOK_DEGREES_PER_COLUMN,
        dy: rows * LOOK_DEGREES_PER_ROW,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_table_covers_every_action() {
        let handler = InputHandler::with_default_bindings();
        for action in Action::ALL {
            assert!(
                handler.bindings.values().any(|b| b.action == action),
                "no key for {}",
                action
            );
        }
    }

    #[test]
    fn test_arrows_map_to_focus() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let cmd = handler.handle_key_at(press(KeyCode::Left), t0).unwrap();
        assert_eq!(cmd.action, Action::FocusLeft);
        assert!(!cmd.boosted);
    }

    #[test]
    fn test_shifted_letter_boosts_movement() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let cmd = handler
            .handle_key_at(KeyEvent::new(KeyCode::Char('W'), KeyModifiers::SHIFT), t0)
            .unwrap();
        assert_eq!(cmd.action, Action::MoveForward);
        assert!(cmd.boosted);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut handler = InputHandler::default();
        let cmd = handler
            .handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(cmd.action, Action::Quit);
    }

    #[test]
    fn test_unbound_key_is_ignored() {
        let mut handler = InputHandler::default();
        assert!(handler.handle_key(press(KeyCode::Char('z'))).is_none());
    }

    #[test]
    fn test_repeatable_waits_for_initial_delay() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let key = press(KeyCode::Right);

        assert!(handler.handle_key_at(key, t0).is_some());
        // Held: events every 30ms, below the release gap
        let mut t = t0;
        let mut fired = 0;
        for _ in 0..10 {
            t += ms(30);
            if handler.handle_key_at(key, t).is_some() {
                fired += 1;
            }
        }
        // 300ms held < 400ms initial delay
        assert_eq!(fired, 0);

        for _ in 0..10 {
            t += ms(30);
            if handler.handle_key_at(key, t).is_some() {
                fired += 1;
            }
        }
        assert!(fired >= 1);
    }

    #[test]
    fn test_quick_taps_after_gap_each_trigger() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let key = press(KeyCode::Right);
        assert!(handler.handle_key_at(key, t0).is_some());
        assert!(handler.handle_key_at(key, t0 + ms(200)).is_some());
        assert!(handler.handle_key_at(key, t0 + ms(400)).is_some());
    }

    #[test]
    fn test_continuous_fires_every_event() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let key = press(KeyCode::Char('a'));
        for i in 0..5 {
            assert!(handler.handle_key_at(key, t0 + ms(i * 20)).is_some());
        }
    }

    #[test]
    fn test_state_change_fires_once_while_held() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let key = press(KeyCode::Home);
        assert!(handler.handle_key_at(key, t0).is_some());
        assert!(handler.handle_key_at(key, t0 + ms(50)).is_none());

        handler.handle_key_release(KeyCode::Home);
        assert!(handler.handle_key_at(key, t0 + ms(60)).is_some());
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_wheel_zooms() {
        let mut pointer = PointerTracker::new();
        assert_eq!(
            pointer.handle(mouse(MouseEventKind::ScrollUp, 0, 0), false),
            Some(MouseInput::Action(Action::ZoomIn))
        );
        assert_eq!(
            pointer.handle(mouse(MouseEventKind::ScrollDown, 0, 0), true),
            Some(MouseInput::Action(Action::ZoomOut))
        );
    }

    #[test]
    fn test_motion_looks_only_while_captured() {
        let mut pointer = PointerTracker::new();
        assert_eq!(pointer.handle(mouse(MouseEventKind::Moved, 10, 10), false), None);
        assert_eq!(pointer.handle(mouse(MouseEventKind::Moved, 12, 10), false), None);

        assert_eq!(
            pointer.handle(mouse(MouseEventKind::Moved, 14, 9), true),
            Some(MouseInput::Look {
                dx: 2.0 * LOOK_DEGREES_PER_COLUMN,
                dy: -LOOK_DEGREES_PER_ROW,
            })
        );
        // No travel, no turn
        assert_eq!(pointer.handle(mouse(MouseEventKind::Moved, 14, 9), true), None);
    }

    #[test]
    fn test_left_drag_always_looks() {
        let mut pointer = PointerTracker::new();
        let left = MouseButton::Left;
        assert_eq!(pointer.handle(mouse(MouseEventKind::Down(left), 40, 5), false), None);
        assert_eq!(
            pointer.handle(mouse(MouseEventKind::Drag(left), 37, 5), false),
            Some(MouseInput::Look {
                dx: -3.0 * LOOK_DEGREES_PER_COLUMN,
                dy: 0.0,
            })
        );
        let right = MouseButton::Right;
        assert_eq!(pointer.handle(mouse(MouseEventKind::Drag(right), 30, 5), false), None);
    }

    #[test]
    fn test_first_motion_has_no_delta() {
        let mut pointer = PointerTracker::new();
        assert_eq!(pointer.handle(mouse(MouseEventKind::Moved, 50, 20), true), None);
    }

    #[test]
    fn test_escape_toggles_mouse_look_and_q_quits() {
        let mut handler = InputHandler::default();
        let t0 = Instant::now();
        let esc = handler.handle_key_at(press(KeyCode::Esc), t0).unwrap();
        assert_eq!(esc.action, Action::ToggleMouseLook);
        let q = handler.handle_key_at(press(KeyCode::Char('q')), t0).unwrap();
        assert_eq!(q.action, Action::Quit);
    }
}
