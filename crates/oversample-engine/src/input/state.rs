use std::collections::HashSet;

use oversample_core::{KeyChord, Modifier};

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, Modifiers};

/// Current keyboard state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies an event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Focus loss swallows key-up events; avoid stuck keys.
                    self.keys_down.clear();
                    self.modifiers = Modifiers::default();
                }
            }

            InputEvent::Key { key, state, modifiers, .. } => {
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
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Level-triggered chord test: true while both key and modifier are held.
    pub fn chord_down(&self, chord: &KeyChord) -> bool {
        let modifier = match chord.modifier {
            Modifier::Control => self.modifiers.ctrl,
            Modifier::Shift => self.modifiers.shift,
            Modifier::Alt => self.modifiers.alt,
        };
        let key = match chord.key {
            oversample_core::Key::T => Key::T,
        };
        modifier && self.key_down(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, ctrl: bool) -> InputEvent {
        InputEvent::Key {
            key,
            state,
            modifiers: Modifiers { ctrl, ..Modifiers::default() },
            repeat: false,
        }
    }

    #[test]
    fn chord_needs_modifier_and_key() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::T, KeyState::Pressed, false));
        assert!(!state.chord_down(&KeyChord::CAPTURE));

        state.apply_event(&mut frame, InputEvent::ModifiersChanged(Modifiers {
            ctrl: true,
            ..Modifiers::default()
        }));
        assert!(state.chord_down(&KeyChord::CAPTURE));

        state.apply_event(&mut frame, key(Key::T, KeyState::Released, true));
        assert!(!state.chord_down(&KeyChord::CAPTURE));
    }

    #[test]
    fn press_is_recorded_once_per_hold() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::F5, KeyState::Pressed, false));
        assert!(frame.pressed(Key::F5));

        frame.clear();
        state.apply_event(&mut frame, key(Key::F5, KeyState::Pressed, false));
        assert!(!frame.pressed(Key::F5));
        assert!(state.key_down(Key::F5));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::T, KeyState::Pressed, true));

        state.apply_event(&mut frame, InputEvent::Focused(false));

        assert!(state.keys_down.is_empty());
        assert!(!state.chord_down(&KeyChord::CAPTURE));
    }
}
