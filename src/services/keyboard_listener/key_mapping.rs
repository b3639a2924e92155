use crate::events::{KeyCode as RawKeyCode, SymbolicKey};
use evdev::KeyCode;

/// Раскладка US: код клавиши -> (символ без shift, символ с shift)
pub struct KeyMapper;

impl KeyMapper {
    /// Литеральный символ, который даёт клавиша с учётом shift
    pub fn get_char(key_code: u16, shift: bool) -> Option<char> {
        let (plain, shifted) = Self::char_pair(KeyCode::new(key_code))?;
        Some(if shift { shifted } else { plain })
    }

    /// Буквенная клавиша (на неё действует Caps Lock)
    pub fn is_letter(key_code: u16) -> bool {
        Self::char_pair(KeyCode::new(key_code)).is_some_and(|(plain, _)| plain.is_ascii_alphabetic())
    }

    /// Символьная идентичность клавиши для событий без литерала
    pub fn get_symbolic_key(key_code: u16) -> SymbolicKey {
        match KeyCode::new(key_code) {
            KeyCode::KEY_SPACE => SymbolicKey::Space,
            KeyCode::KEY_ENTER | KeyCode::KEY_KPENTER => SymbolicKey::Enter,
            _ => SymbolicKey::Other(RawKeyCode::new(key_code)),
        }
    }

    fn char_pair(keycode: KeyCode) -> Option<(char, char)> {
        let pair = match keycode {
            // Буквенные клавиши
            KeyCode::KEY_A => ('a', 'A'),
            KeyCode::KEY_B => ('b', 'B'),
            KeyCode::KEY_C => ('c', 'C'),
            KeyCode::KEY_D => ('d', 'D'),
            KeyCode::KEY_E => ('e', 'E'),
            KeyCode::KEY_F => ('f', 'F'),
            KeyCode::KEY_G => ('g', 'G'),
            KeyCode::KEY_H => ('h', 'H'),
            KeyCode::KEY_I => ('i', 'I'),
            KeyCode::KEY_J => ('j', 'J'),
            KeyCode::KEY_K => ('k', 'K'),
            KeyCode::KEY_L => ('l', 'L'),
            KeyCode::KEY_M => ('m', 'M'),
            KeyCode::KEY_N => ('n', 'N'),
            KeyCode::KEY_O => ('o', 'O'),
            KeyCode::KEY_P => ('p', 'P'),
            KeyCode::KEY_Q => ('q', 'Q'),
            KeyCode::KEY_R => ('r', 'R'),
            KeyCode::KEY_S => ('s', 'S'),
            KeyCode::KEY_T => ('t', 'T'),
            KeyCode::KEY_U => ('u', 'U'),
            KeyCode::KEY_V => ('v', 'V'),
            KeyCode::KEY_W => ('w', 'W'),
            KeyCode::KEY_X => ('x', 'X'),
            KeyCode::KEY_Y => ('y', 'Y'),
            KeyCode::KEY_Z => ('z', 'Z'),

            // Цифровые клавиши
            KeyCode::KEY_1 => ('1', '!'),
            KeyCode::KEY_2 => ('2', '@'),
            KeyCode::KEY_3 => ('3', '#'),
            KeyCode::KEY_4 => ('4', '$'),
            KeyCode::KEY_5 => ('5', '%'),
            KeyCode::KEY_6 => ('6', '^'),
            KeyCode::KEY_7 => ('7', '&'),
            KeyCode::KEY_8 => ('8', '*'),
            KeyCode::KEY_9 => ('9', '('),
            KeyCode::KEY_0 => ('0', ')'),

            // Пунктуация
            KeyCode::KEY_MINUS => ('-', '_'),
            KeyCode::KEY_EQUAL => ('=', '+'),
            KeyCode::KEY_LEFTBRACE => ('[', '{'),
            KeyCode::KEY_RIGHTBRACE => (']', '}'),
            KeyCode::KEY_SEMICOLON => (';', ':'),
            KeyCode::KEY_APOSTROPHE => ('\'', '"'),
            KeyCode::KEY_GRAVE => ('`', '~'),
            KeyCode::KEY_BACKSLASH => ('\\', '|'),
            KeyCode::KEY_COMMA => (',', '<'),
            KeyCode::KEY_DOT => ('.', '>'),
            KeyCode::KEY_SLASH => ('/', '?'),

            // Цифровой блок
            KeyCode::KEY_KP0 => ('0', '0'),
            KeyCode::KEY_KP1 => ('1', '1'),
            KeyCode::KEY_KP2 => ('2', '2'),
            KeyCode::KEY_KP3 => ('3', '3'),
            KeyCode::KEY_KP4 => ('4', '4'),
            KeyCode::KEY_KP5 => ('5', '5'),
            KeyCode::KEY_KP6 => ('6', '6'),
            KeyCode::KEY_KP7 => ('7', '7'),
            KeyCode::KEY_KP8 => ('8', '8'),
            KeyCode::KEY_KP9 => ('9', '9'),
            KeyCode::KEY_KPDOT => ('.', '.'),
            KeyCode::KEY_KPPLUS => ('+', '+'),
            KeyCode::KEY_KPMINUS => ('-', '-'),
            KeyCode::KEY_KPASTERISK => ('*', '*'),
            KeyCode::KEY_KPSLASH => ('/', '/'),
            _ => return None,
        };
        Some(pair)
    }
}
