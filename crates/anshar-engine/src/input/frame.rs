use std::collections::HashSet;

use super::types::{Key, MouseButton};

/// Per-frame input transitions.
///
/// Cleared by the runtime after each frame is consumed; edge queries
/// (`pressed` / `released`) and the accumulated pointer delta are only valid
/// within the frame they were produced for.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys that transitioned to down this frame.
    pub keys_pressed: HashSet<Key>,

    /// Keys that transitioned to up this frame.
    pub keys_released: HashSet<Key>,

    /// Buttons that transitioned to down this frame.
    pub buttons_pressed: HashSet<MouseButton>,

    /// Buttons that transitioned to up this frame.
    pub buttons_released: HashSet<MouseButton>,

    /// Pointer movement accumulated since the previous frame, logical pixels.
    ///
    /// This is the sum of position deltas, so several small cursor events in
    /// one frame behave the same as one large one. Used for mouse-look.
    pub pointer_delta: (f32, f32),
}

impl InputFrame {
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn button_pressed(&self, btn: MouseButton) -> bool {
        self.buttons_pressed.contains(&btn)
    }

    /// Clears transitions and the pointer delta. Keeps allocated capacity.
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = (0.0, 0.0);
    }
}
