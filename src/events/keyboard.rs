use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Преобразование значения evdev (0/1/2)
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Символьная идентичность клавиши, не дающей литерального символа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolicKey {
    Space,
    Enter,
    /// Модификаторы, стрелки, функциональные и прочие клавиши
    Other(KeyCode),
}

impl fmt::Display for SymbolicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolicKey::Space => write!(f, "Key.space"),
            SymbolicKey::Enter => write!(f, "Key.enter"),
            SymbolicKey::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.super_key { result.push("super"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Сырое событие клавиатуры: литеральный символ (если есть) и символьная клавиша
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub modifiers: Modifiers,
    pub character: Option<char>,
    pub key: SymbolicKey,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(
        key_code: KeyCode,
        state: KeyState,
        modifiers: Modifiers,
        character: Option<char>,
        key: SymbolicKey,
    ) -> Self {
        Self {
            key_code,
            state,
            modifiers,
            character,
            key,
            timestamp: std::time::Instant::now(),
        }
    }

    /// Нажатие печатного символа
    pub fn char_press(ch: char) -> Self {
        Self::new(
            KeyCode::new(0),
            KeyState::Pressed,
            Modifiers::new(),
            Some(ch),
            SymbolicKey::Other(KeyCode::new(0)),
        )
    }

    /// Нажатие клавиши без символа
    pub fn key_press(key: SymbolicKey) -> Self {
        let key_code = match key {
            SymbolicKey::Other(code) => code,
            _ => KeyCode::new(0),
        };
        Self::new(key_code, KeyState::Pressed, Modifiers::new(), None, key)
    }

    /// Получить уникальный идентификатор комбинации клавиш
    pub fn combination_id(&self) -> String {
        if self.modifiers.is_empty() {
            format!("{}", self.key_code.value())
        } else {
            format!("{}+{}", self.modifiers, self.key_code.value())
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch={:?} key={} {:?}",
            self.combination_id(),
            self.character,
            self.key,
            self.state,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_creation() {
        let modifiers = Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::new()
        };

        assert!(modifiers.ctrl);
        assert!(modifiers.shift);
        assert!(!modifiers.alt);
        assert!(!modifiers.super_key);
        assert_eq!(modifiers.to_string(), "ctrl+shift");
    }

    #[test]
    fn test_key_state_from_evdev_value() {
        assert_eq!(KeyState::from_evdev_value(0), Some(KeyState::Released));
        assert_eq!(KeyState::from_evdev_value(1), Some(KeyState::Pressed));
        assert_eq!(KeyState::from_evdev_value(2), Some(KeyState::Repeat));
        assert_eq!(KeyState::from_evdev_value(7), None);
    }

    #[test]
    fn test_key_event_combination_id() {
        let mut event = KeyEvent::key_press(SymbolicKey::Other(KeyCode::new(42)));
        assert_eq!(event.combination_id(), "42");

        event.modifiers.ctrl = true;
        assert_eq!(event.combination_id(), "ctrl+42");
    }

    #[test]
    fn test_symbolic_key_display() {
        assert_eq!(SymbolicKey::Space.to_string(), "Key.space");
        assert_eq!(SymbolicKey::Other(KeyCode::new(30)).to_string(), "KEY_30");
    }
}
