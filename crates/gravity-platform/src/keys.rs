//! Physical key codes to framework key names.

use gravity_core::KeyName;
use winit::keyboard::KeyCode;

/// Map a winit key code to a [`KeyName`]. Keys the framework does not name
/// map to `None` and are not reported.
#[must_use]
pub const fn key_name(code: KeyCode) -> Option<KeyName> {
    let name = match code {
        KeyCode::KeyA => KeyName::A,
        KeyCode::KeyB => KeyName::B,
        KeyCode::KeyC => KeyName::C,
        KeyCode::KeyD => KeyName::D,
        KeyCode::KeyE => KeyName::E,
        KeyCode::KeyF => KeyName::F,
        KeyCode::KeyG => KeyName::G,
        KeyCode::KeyH => KeyName::H,
        KeyCode::KeyI => KeyName::I,
        KeyCode::KeyJ => KeyName::J,
        KeyCode::KeyK => KeyName::K,
        KeyCode::KeyL => KeyName::L,
        KeyCode::KeyM => KeyName::M,
        KeyCode::KeyN => KeyName::N,
        KeyCode::KeyO => KeyName::O,
        KeyCode::KeyP => KeyName::P,
        KeyCode::KeyQ => KeyName::Q,
        KeyCode::KeyR => KeyName::R,
        KeyCode::KeyS => KeyName::S,
        KeyCode::KeyT => KeyName::T,
        KeyCode::KeyU => KeyName::U,
        KeyCode::KeyV => KeyName::V,
        KeyCode::KeyW => KeyName::W,
        KeyCode::KeyX => KeyName::X,
        KeyCode::KeyY => KeyName::Y,
        KeyCode::KeyZ => KeyName::Z,
        KeyCode::Space => KeyName::Space,
        KeyCode::Digit0 => KeyName::Digit0,
        KeyCode::Digit1 => KeyName::Digit1,
        KeyCode::Digit2 => KeyName::Digit2,
        KeyCode::Digit3 => KeyName::Digit3,
        KeyCode::Digit4 => KeyName::Digit4,
        KeyCode::Digit5 => KeyName::Digit5,
        KeyCode::Digit6 => KeyName::Digit6,
        KeyCode::Digit7 => KeyName::Digit7,
        KeyCode::Digit8 => KeyName::Digit8,
        KeyCode::Digit9 => KeyName::Digit9,
        KeyCode::Backquote => KeyName::Tilde,
        KeyCode::Minus => KeyName::Dash,
        KeyCode::Equal => KeyName::Plus,
        KeyCode::BracketLeft => KeyName::LeftBracket,
        KeyCode::BracketRight => KeyName::RightBracket,
        KeyCode::Semicolon => KeyName::Colon,
        KeyCode::Quote => KeyName::Quote,
        KeyCode::Comma => KeyName::Comma,
        KeyCode::Period => KeyName::Period,
        KeyCode::Slash => KeyName::ForwardSlash,
        KeyCode::Backslash => KeyName::Backslash,
        KeyCode::Tab => KeyName::Tab,
        KeyCode::Backspace => KeyName::Backspace,
        KeyCode::ControlLeft => KeyName::LeftCtrl,
        KeyCode::ControlRight => KeyName::RightCtrl,
        KeyCode::ShiftLeft => KeyName::LeftShift,
        KeyCode::ShiftRight => KeyName::RightShift,
        KeyCode::AltLeft => KeyName::LeftAlt,
        KeyCode::AltRight => KeyName::RightAlt,
        KeyCode::PageUp => KeyName::PageUp,
        KeyCode::PageDown => KeyName::PageDown,
        KeyCode::Home => KeyName::Home,
        KeyCode::End => KeyName::End,
        KeyCode::ArrowUp => KeyName::ArrowUp,
        KeyCode::ArrowDown => KeyName::ArrowDown,
        KeyCode::ArrowLeft => KeyName::ArrowLeft,
        KeyCode::ArrowRight => KeyName::ArrowRight,
        KeyCode::Escape => KeyName::Escape,
        KeyCode::F1 => KeyName::F1,
        KeyCode::F2 => KeyName::F2,
        KeyCode::F3 => KeyName::F3,
        KeyCode::F4 => KeyName::F4,
        KeyCode::F5 => KeyName::F5,
        KeyCode::F6 => KeyName::F6,
        KeyCode::F7 => KeyName::F7,
        KeyCode::F8 => KeyName::F8,
        KeyCode::F9 => KeyName::F9,
        KeyCode::F10 => KeyName::F10,
        KeyCode::F11 => KeyName::F11,
        KeyCode::F12 => KeyName::F12,
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_controls() {
        assert_eq!(key_name(KeyCode::KeyW), Some(KeyName::W));
        assert_eq!(key_name(KeyCode::Escape), Some(KeyName::Escape));
        assert_eq!(key_name(KeyCode::Space), Some(KeyName::Space));
        assert_eq!(key_name(KeyCode::ArrowLeft), Some(KeyName::ArrowLeft));
    }

    #[test]
    fn punctuation_uses_us_layout_names() {
        assert_eq!(key_name(KeyCode::Backquote), Some(KeyName::Tilde));
        assert_eq!(key_name(KeyCode::Equal), Some(KeyName::Plus));
        assert_eq!(key_name(KeyCode::Semicolon), Some(KeyName::Colon));
    }

    #[test]
    fn unnamed_keys_are_dropped() {
        assert_eq!(key_name(KeyCode::NumLock), None);
        assert_eq!(key_name(KeyCode::F13), None);
        assert_eq!(key_name(KeyCode::Numpad5), None);
    }
}
