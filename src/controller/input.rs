/// Platform-agnostic input handling
use std::collections::HashSet;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Pointer events, deltas in physical pixels
    PointerDown { button: MouseButton },
    PointerUp { button: MouseButton },
    PointerMove { dx: f32, dy: f32 },
    Wheel { delta_y: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Option<Self> {
        match button {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            _ => None,
        }
    }
}

/// Single characters are stored lowercase so `w` and `W` (Shift held) are
/// the same key; named keys (`Shift`, `ArrowUp`, ...) are kept verbatim.
pub fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

/// Up/down state of every key seen so far
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pressed_keys: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update key state from an event. Pointer events are ignored here.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.press(key),
            InputEvent::KeyUp(key) => self.release(key),
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => self.clear_keys(),
            _ => {}
        }
    }

    pub fn press(&mut self, key: &str) {
        self.pressed_keys.insert(normalize_key(key));
    }

    pub fn release(&mut self, key: &str) {
        self.pressed_keys.remove(&normalize_key(key));
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(&normalize_key(key))
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn pressed_count(&self) -> usize {
        self.pressed_keys.len()
    }
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub ascend: String,
    pub descend: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            ascend: " ".to_string(),
            descend: "Shift".to_string(),
        }
    }
}

impl KeyBindings {
    /// Keys whose browser default action (scrolling) should be suppressed
    pub fn is_movement_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        [&self.forward, &self.backward, &self.left, &self.right, &self.ascend, &self.descend]
            .iter()
            .any(|k| normalize_key(k) == key)
    }
}

pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, is_down: bool) -> Option<InputEvent> {
        let button = MouseButton::from_web_button(e.button())?;
        Some(if is_down {
            InputEvent::PointerDown { button }
        } else {
            InputEvent::PointerUp { button }
        })
    }

    /// `movementX/Y` are CSS pixels; scale them to the canvas' physical pixels
    pub fn mouse_move_to_input(e: &MouseEvent, device_pixel_ratio: f64) -> InputEvent {
        InputEvent::PointerMove {
            dx: (e.movement_x() as f64 * device_pixel_ratio) as f32,
            dy: (e.movement_y() as f64 * device_pixel_ratio) as f32,
        }
    }

    pub fn wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::Wheel { delta_y: e.delta_y() as f32 }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent, MouseScrollDelta};
    use winit::keyboard::{Key, NamedKey};

    /// Map a winit key to the DOM `KeyboardEvent.key` name used by the bindings
    pub fn key_name(key: &Key) -> Option<String> {
        match key {
            Key::Character(c) => Some(c.to_string()),
            Key::Named(NamedKey::Space) => Some(" ".to_string()),
            Key::Named(named) => Some(format!("{named:?}")),
            _ => None,
        }
    }

    pub fn key_event_to_input(event: &KeyEvent) -> Option<InputEvent> {
        let key = key_name(&event.logical_key)?;
        Some(match event.state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        })
    }

    pub fn mouse_button_to_input(state: ElementState, button: winit::event::MouseButton) -> Option<InputEvent> {
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        Some(match state {
            ElementState::Pressed => InputEvent::PointerDown { button },
            ElementState::Released => InputEvent::PointerUp { button },
        })
    }

    /// Line deltas are converted to the ~100 px per notch browsers report
    pub fn wheel_to_input(delta: &MouseScrollDelta) -> InputEvent {
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
            MouseScrollDelta::PixelDelta(p) => -p.y as f32,
        };
        InputEvent::Wheel { delta_y }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_down_then_up() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("w".into()));
        assert!(input.is_key_pressed("w"));
        input.process_event(&InputEvent::KeyUp("w".into()));
        assert!(!input.is_key_pressed("w"));
    }

    #[test]
    fn shifted_release_does_not_stick() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("w".into()));
        input.process_event(&InputEvent::KeyDown("Shift".into()));
        input.process_event(&InputEvent::KeyUp("W".into()));
        assert!(!input.is_key_pressed("w"));
        assert!(input.is_key_pressed("Shift"));
        assert!(!input.is_key_pressed("shift"), "named keys are case sensitive");
    }

    #[test]
    fn unknown_keys_are_tracked() {
        let mut input = InputState::new();
        input.press("F13");
        assert!(input.is_key_pressed("F13"));
        assert_eq!(input.pressed_count(), 1);
    }

    #[test]
    fn repeated_key_down_is_idempotent() {
        let mut input = InputState::new();
        input.press("d");
        input.press("d");
        input.release("d");
        assert!(!input.is_key_pressed("d"));
    }

    #[test]
    fn focus_loss_clears_everything() {
        let mut input = InputState::new();
        input.press("w");
        input.press(" ");
        input.process_event(&InputEvent::FocusLost);
        assert_eq!(input.pressed_count(), 0);

        input.press("a");
        input.process_event(&InputEvent::VisibilityChanged { visible: false });
        assert!(!input.is_key_pressed("a"));
    }

    #[test]
    fn pointer_events_leave_keys_alone() {
        let mut input = InputState::new();
        input.press("w");
        input.process_event(&InputEvent::PointerMove { dx: 3.0, dy: 1.0 });
        input.process_event(&InputEvent::Wheel { delta_y: 100.0 });
        assert!(input.is_key_pressed("w"));
    }

    #[test]
    fn movement_keys() {
        let bindings = KeyBindings::default();
        assert!(bindings.is_movement_key("W"));
        assert!(bindings.is_movement_key(" "));
        assert!(bindings.is_movement_key("Shift"));
        assert!(!bindings.is_movement_key("q"));
    }
}
