//! Scan-code key definitions and the US text layout.

use crate::stroke::KeyState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keys as the driver sees them: set-1 scan codes.
///
/// Extended keys reuse the scan code of a non-extended key and are told apart
/// by [`KeyState::E0`]; [`Key::from_stroke`] takes that into account and
/// [`Key::is_extended`] reports which keys need it when sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    Escape,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Num0,
    Minus,
    Equal,
    Backspace,
    Tab,
    KeyQ,
    KeyW,
    KeyE,
    KeyR,
    KeyT,
    KeyY,
    KeyU,
    KeyI,
    KeyO,
    KeyP,
    BracketLeft,
    BracketRight,
    Enter,
    ControlLeft,
    KeyA,
    KeyS,
    KeyD,
    KeyF,
    KeyG,
    KeyH,
    KeyJ,
    KeyK,
    KeyL,
    Semicolon,
    Quote,
    Grave,
    ShiftLeft,
    Backslash,
    KeyZ,
    KeyX,
    KeyC,
    KeyV,
    KeyB,
    KeyN,
    KeyM,
    Comma,
    Period,
    Slash,
    ShiftRight,
    NumpadMultiply,
    AltLeft,
    Space,
    CapsLock,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    NumLock,
    ScrollLock,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadSubtract,
    Numpad4,
    Numpad5,
    Numpad6,
    NumpadAdd,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad0,
    NumpadDecimal,
    F11,
    F12,

    // Extended (E0) keys
    NumpadEnter,
    ControlRight,
    NumpadDivide,
    AltRight,
    Home,
    ArrowUp,
    PageUp,
    ArrowLeft,
    ArrowRight,
    End,
    ArrowDown,
    PageDown,
    Insert,
    Delete,
    MetaLeft,
    MetaRight,
    ContextMenu,

    /// Any other scan code, including E0 codes outside the extended set and
    /// E1 strokes. The stroke's prefix bits are kept when it is forwarded.
    Unknown(u16),
}

impl Key {
    /// Scan code written into a key stroke.
    pub fn scan_code(self) -> u16 {
        match self {
            Key::Escape => 0x01,
            Key::Num1 => 0x02,
            Key::Num2 => 0x03,
            Key::Num3 => 0x04,
            Key::Num4 => 0x05,
            Key::Num5 => 0x06,
            Key::Num6 => 0x07,
            Key::Num7 => 0x08,
            Key::Num8 => 0x09,
            Key::Num9 => 0x0A,
            Key::Num0 => 0x0B,
            Key::Minus => 0x0C,
            Key::Equal => 0x0D,
            Key::Backspace => 0x0E,
            Key::Tab => 0x0F,
            Key::KeyQ => 0x10,
            Key::KeyW => 0x11,
            Key::KeyE => 0x12,
            Key::KeyR => 0x13,
            Key::KeyT => 0x14,
            Key::KeyY => 0x15,
            Key::KeyU => 0x16,
            Key::KeyI => 0x17,
            Key::KeyO => 0x18,
            Key::KeyP => 0x19,
            Key::BracketLeft => 0x1A,
            Key::BracketRight => 0x1B,
            Key::Enter | Key::NumpadEnter => 0x1C,
            Key::ControlLeft | Key::ControlRight => 0x1D,
            Key::KeyA => 0x1E,
            Key::KeyS => 0x1F,
            Key::KeyD => 0x20,
            Key::KeyF => 0x21,
            Key::KeyG => 0x22,
            Key::KeyH => 0x23,
            Key::KeyJ => 0x24,
            Key::KeyK => 0x25,
            Key::KeyL => 0x26,
            Key::Semicolon => 0x27,
            Key::Quote => 0x28,
            Key::Grave => 0x29,
            Key::ShiftLeft => 0x2A,
            Key::Backslash => 0x2B,
            Key::KeyZ => 0x2C,
            Key::KeyX => 0x2D,
            Key::KeyC => 0x2E,
            Key::KeyV => 0x2F,
            Key::KeyB => 0x30,
            Key::KeyN => 0x31,
            Key::KeyM => 0x32,
            Key::Comma => 0x33,
            Key::Period => 0x34,
            Key::Slash | Key::NumpadDivide => 0x35,
            Key::ShiftRight => 0x36,
            Key::NumpadMultiply => 0x37,
            Key::AltLeft | Key::AltRight => 0x38,
            Key::Space => 0x39,
            Key::CapsLock => 0x3A,
            Key::F1 => 0x3B,
            Key::F2 => 0x3C,
            Key::F3 => 0x3D,
            Key::F4 => 0x3E,
            Key::F5 => 0x3F,
            Key::F6 => 0x40,
            Key::F7 => 0x41,
            Key::F8 => 0x42,
            Key::F9 => 0x43,
            Key::F10 => 0x44,
            Key::NumLock => 0x45,
            Key::ScrollLock => 0x46,
            Key::Numpad7 | Key::Home => 0x47,
            Key::Numpad8 | Key::ArrowUp => 0x48,
            Key::Numpad9 | Key::PageUp => 0x49,
            Key::NumpadSubtract => 0x4A,
            Key::Numpad4 | Key::ArrowLeft => 0x4B,
            Key::Numpad5 => 0x4C,
            Key::Numpad6 | Key::ArrowRight => 0x4D,
            Key::NumpadAdd => 0x4E,
            Key::Numpad1 | Key::End => 0x4F,
            Key::Numpad2 | Key::ArrowDown => 0x50,
            Key::Numpad3 | Key::PageDown => 0x51,
            Key::Numpad0 | Key::Insert => 0x52,
            Key::NumpadDecimal | Key::Delete => 0x53,
            Key::F11 => 0x57,
            Key::F12 => 0x58,
            Key::MetaLeft => 0x5B,
            Key::MetaRight => 0x5C,
            Key::ContextMenu => 0x5D,
            Key::Unknown(code) => code,
        }
    }

    /// Whether the key must be sent with [`KeyState::E0`].
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            Key::NumpadEnter
                | Key::ControlRight
                | Key::NumpadDivide
                | Key::AltRight
                | Key::Home
                | Key::ArrowUp
                | Key::PageUp
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::End
                | Key::ArrowDown
                | Key::PageDown
                | Key::Insert
                | Key::Delete
                | Key::MetaLeft
                | Key::MetaRight
                | Key::ContextMenu
        )
    }

    /// Decode the key of a received stroke.
    ///
    /// E0 codes outside the extended table (Print Screen, the fake shifts
    /// some keyboards emit) and every E1 stroke (Pause) decode to
    /// [`Key::Unknown`] so they never alias a plain key.
    pub fn from_stroke(code: u16, state: KeyState) -> Key {
        if state.contains(KeyState::E1) {
            return Key::Unknown(code);
        }
        if !state.contains(KeyState::E0) {
            return Key::from_scan_code(code);
        }
        match code {
            0x1C => Key::NumpadEnter,
            0x1D => Key::ControlRight,
            0x35 => Key::NumpadDivide,
            0x38 => Key::AltRight,
            0x47 => Key::Home,
            0x48 => Key::ArrowUp,
            0x49 => Key::PageUp,
            0x4B => Key::ArrowLeft,
            0x4D => Key::ArrowRight,
            0x4F => Key::End,
            0x50 => Key::ArrowDown,
            0x51 => Key::PageDown,
            0x52 => Key::Insert,
            0x53 => Key::Delete,
            0x5B => Key::MetaLeft,
            0x5C => Key::MetaRight,
            0x5D => Key::ContextMenu,
            _ => Key::Unknown(code),
        }
    }

    /// Decode a scan code without an E0 prefix.
    pub fn from_scan_code(code: u16) -> Key {
        match code {
            0x01 => Key::Escape,
            0x02 => Key::Num1,
            0x03 => Key::Num2,
            0x04 => Key::Num3,
            0x05 => Key::Num4,
            0x06 => Key::Num5,
            0x07 => Key::Num6,
            0x08 => Key::Num7,
            0x09 => Key::Num8,
            0x0A => Key::Num9,
            0x0B => Key::Num0,
            0x0C => Key::Minus,
            0x0D => Key::Equal,
            0x0E => Key::Backspace,
            0x0F => Key::Tab,
            0x10 => Key::KeyQ,
            0x11 => Key::KeyW,
            0x12 => Key::KeyE,
            0x13 => Key::KeyR,
            0x14 => Key::KeyT,
            0x15 => Key::KeyY,
            0x16 => Key::KeyU,
            0x17 => Key::KeyI,
            0x18 => Key::KeyO,
            0x19 => Key::KeyP,
            0x1A => Key::BracketLeft,
            0x1B => Key::BracketRight,
            0x1C => Key::Enter,
            0x1D => Key::ControlLeft,
            0x1E => Key::KeyA,
            0x1F => Key::KeyS,
            0x20 => Key::KeyD,
            0x21 => Key::KeyF,
            0x22 => Key::KeyG,
            0x23 => Key::KeyH,
            0x24 => Key::KeyJ,
            0x25 => Key::KeyK,
            0x26 => Key::KeyL,
            0x27 => Key::Semicolon,
            0x28 => Key::Quote,
            0x29 => Key::Grave,
            0x2A => Key::ShiftLeft,
            0x2B => Key::Backslash,
            0x2C => Key::KeyZ,
            0x2D => Key::KeyX,
            0x2E => Key::KeyC,
            0x2F => Key::KeyV,
            0x30 => Key::KeyB,
            0x31 => Key::KeyN,
            0x32 => Key::KeyM,
            0x33 => Key::Comma,
            0x34 => Key::Period,
            0x35 => Key::Slash,
            0x36 => Key::ShiftRight,
            0x37 => Key::NumpadMultiply,
            0x38 => Key::AltLeft,
            0x39 => Key::Space,
            0x3A => Key::CapsLock,
            0x3B => Key::F1,
            0x3C => Key::F2,
            0x3D => Key::F3,
            0x3E => Key::F4,
            0x3F => Key::F5,
            0x40 => Key::F6,
            0x41 => Key::F7,
            0x42 => Key::F8,
            0x43 => Key::F9,
            0x44 => Key::F10,
            0x45 => Key::NumLock,
            0x46 => Key::ScrollLock,
            0x47 => Key::Numpad7,
            0x48 => Key::Numpad8,
            0x49 => Key::Numpad9,
            0x4A => Key::NumpadSubtract,
            0x4B => Key::Numpad4,
            0x4C => Key::Numpad5,
            0x4D => Key::Numpad6,
            0x4E => Key::NumpadAdd,
            0x4F => Key::Numpad1,
            0x50 => Key::Numpad2,
            0x51 => Key::Numpad3,
            0x52 => Key::Numpad0,
            0x53 => Key::NumpadDecimal,
            0x57 => Key::F11,
            0x58 => Key::F12,
            other => Key::Unknown(other),
        }
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::ShiftLeft
                | Key::ShiftRight
                | Key::ControlLeft
                | Key::ControlRight
                | Key::AltLeft
                | Key::AltRight
                | Key::MetaLeft
                | Key::MetaRight
        )
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::Unknown(0)
    }
}

/// Map a character to its key on a US layout and whether Shift is needed.
///
/// Letters match case-insensitively; uppercase letters need Shift. Returns
/// `None` for anything outside the table.
pub fn char_to_key(c: char) -> Option<(Key, bool)> {
    if c.is_ascii_alphabetic() {
        let key = letter_key(c.to_ascii_lowercase())?;
        return Some((key, c.is_ascii_uppercase()));
    }

    let mapping = match c {
        '1' => (Key::Num1, false),
        '2' => (Key::Num2, false),
        '3' => (Key::Num3, false),
        '4' => (Key::Num4, false),
        '5' => (Key::Num5, false),
        '6' => (Key::Num6, false),
        '7' => (Key::Num7, false),
        '8' => (Key::Num8, false),
        '9' => (Key::Num9, false),
        '0' => (Key::Num0, false),
        '!' => (Key::Num1, true),
        '@' => (Key::Num2, true),
        '#' => (Key::Num3, true),
        '$' => (Key::Num4, true),
        '%' => (Key::Num5, true),
        '^' => (Key::Num6, true),
        '&' => (Key::Num7, true),
        '*' => (Key::Num8, true),
        '(' => (Key::Num9, true),
        ')' => (Key::Num0, true),
        '-' => (Key::Minus, false),
        '_' => (Key::Minus, true),
        '=' => (Key::Equal, false),
        '+' => (Key::Equal, true),
        '[' => (Key::BracketLeft, false),
        '{' => (Key::BracketLeft, true),
        ']' => (Key::BracketRight, false),
        '}' => (Key::BracketRight, true),
        ';' => (Key::Semicolon, false),
        ':' => (Key::Semicolon, true),
        '\'' => (Key::Quote, false),
        '"' => (Key::Quote, true),
        ',' => (Key::Comma, false),
        '<' => (Key::Comma, true),
        '.' => (Key::Period, false),
        '>' => (Key::Period, true),
        '/' => (Key::Slash, false),
        '?' => (Key::Slash, true),
        '\\' => (Key::Backslash, false),
        '|' => (Key::Backslash, true),
        '`' => (Key::Grave, false),
        '~' => (Key::Grave, true),
        ' ' => (Key::Space, false),
        '\n' => (Key::Enter, false),
        '\t' => (Key::Tab, false),
        _ => return None,
    };
    Some(mapping)
}

fn letter_key(c: char) -> Option<Key> {
    let key = match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        _ => return None,
    };
    Some(key)
}
