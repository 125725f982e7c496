use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for the window.
///
/// Holds "is down" information and the pointer position; per-frame
/// transitions and movement deltas are recorded into an [`InputFrame`].
#[derive(Debug, Default)]
pub struct InputState {
    /// Current modifier state.
    pub modifiers: Modifiers,

    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels, `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // On focus loss, clear "down" sets. Avoids stuck movement
                    // keys when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;

                match state {
                    KeyState::Pressed => {
                        if self.keys_down.insert(*key) {
                            frame.keys_pressed.insert(*key);
                        }
                    }
                    KeyState::Released => {
                        if self.keys_down.remove(key) {
                            frame.keys_released.insert(*key);
                        }
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                // A button event carries a real position only once a cursor
                // move has been seen; until then the payload is a placeholder
                // and must not become the delta baseline.
                if self.pointer_pos.is_some() {
                    self.pointer_pos = Some((*x, *y));
                }
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    MouseButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                    }
                }
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    #[test]
    fn press_and_release_edges() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        assert!(state.key_down(Key::W));
        assert!(frame.pressed(Key::W));

        frame.clear();

        // A repeat press while held is not a new edge.
        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        assert!(!frame.pressed(Key::W));

        state.apply_event(&mut frame, key(Key::W, KeyState::Released));
        assert!(!state.key_down(Key::W));
        assert!(frame.released(Key::W));
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(!state.key_down(Key::W));
    }

    #[test]
    fn pointer_delta_accumulates_across_moves() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        let mv = |x, y| InputEvent::PointerMoved(PointerMoveEvent { x, y });

        // First move establishes a position; no delta yet.
        state.apply_event(&mut frame, mv(100.0, 100.0));
        assert_eq!(frame.pointer_delta, (0.0, 0.0));

        state.apply_event(&mut frame, mv(104.0, 98.0));
        state.apply_event(&mut frame, mv(105.0, 98.0));
        assert_eq!(frame.pointer_delta, (5.0, -2.0));

        frame.clear();
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn button_before_any_move_does_not_seed_delta_baseline() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        // A click arrives before any cursor move; its placeholder position
        // must not count as a known pointer position.
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                x: 0.0,
                y: 0.0,
                modifiers: Modifiers::default(),
            }),
        );
        assert!(state.button_down(MouseButton::Left));
        assert_eq!(state.pointer_pos, None);

        // The first real move establishes the baseline without a jump.
        state.apply_event(
            &mut frame,
            InputEvent::PointerMoved(PointerMoveEvent { x: 640.0, y: 360.0 }),
        );
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn pointer_left_resets_delta_baseline() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        let mv = |x, y| InputEvent::PointerMoved(PointerMoveEvent { x, y });

        state.apply_event(&mut frame, mv(10.0, 10.0));
        state.apply_event(&mut frame, InputEvent::PointerLeft);
        // Re-entry far away must not produce a spurious jump.
        state.apply_event(&mut frame, mv(500.0, 500.0));
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }
}
