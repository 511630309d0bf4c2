use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// Pressed-key set maintained from window events and polled once per
/// frame. The frame loop only ever asks about the fixed demo key set
/// (arrows to look, WASD to move, Space/LShift for vertical).
#[derive(Debug, Default)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(code);
        } else {
            self.pressed.remove(&code);
        }
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_toggle_with_press_and_release() {
        let mut input = InputState::new();
        assert!(!input.is_down(KeyCode::KeyW));

        input.handle_key(KeyCode::KeyW, true);
        assert!(input.is_down(KeyCode::KeyW));

        // Repeats keep the key held.
        input.handle_key(KeyCode::KeyW, true);
        assert!(input.is_down(KeyCode::KeyW));

        input.handle_key(KeyCode::KeyW, false);
        assert!(!input.is_down(KeyCode::KeyW));
    }
}
