use crate::events::Modifiers;
use evdev::KeyCode;

#[derive(Debug, Default)]
pub struct ModifierState {
    ctrl: bool,
    alt: bool,
    shift: bool,
    super_key: bool,
    caps_lock: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
            super_key: self.super_key,
        }
    }

    /// Shift для букв с учётом Caps Lock
    pub fn letter_shift(&self) -> bool {
        self.shift != self.caps_lock
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    pub fn update_key(&mut self, key: KeyCode, pressed: bool) {
        match key {
            KeyCode::KEY_LEFTCTRL | KeyCode::KEY_RIGHTCTRL => self.ctrl = pressed,
            KeyCode::KEY_LEFTALT | KeyCode::KEY_RIGHTALT => self.alt = pressed,
            KeyCode::KEY_LEFTSHIFT | KeyCode::KEY_RIGHTSHIFT => self.shift = pressed,
            KeyCode::KEY_LEFTMETA | KeyCode::KEY_RIGHTMETA => self.super_key = pressed,
            // Caps Lock переключается по нажатию
            KeyCode::KEY_CAPSLOCK if pressed => self.caps_lock = !self.caps_lock,
            _ => {}
        }
    }
}
