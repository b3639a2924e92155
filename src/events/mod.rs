pub mod keyboard;

pub use keyboard::{KeyCode, KeyEvent, KeyState, Modifiers, SymbolicKey};
