//! Logical hexadecimal keypad.
//!
//! Mapping physical input devices to these keys is left to the host.
use std::str::FromStr;

use crate::constants::*;

/// One of the 16 keys of the keypad, identified by its nibble value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    /// All keys in nibble order.
    #[rustfmt::skip]
    pub const ALL: [KeyCode; KEY_COUNT as usize] = [
        Self::Key0, Self::Key1, Self::Key2, Self::Key3,
        Self::Key4, Self::Key5, Self::Key6, Self::Key7,
        Self::Key8, Self::Key9, Self::KeyA, Self::KeyB,
        Self::KeyC, Self::KeyD, Self::KeyE, Self::KeyF,
    ];

    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(key_id as usize)
            .copied()
            .ok_or(InvalidKeyCode)
    }
}

/// Parses a single hexadecimal digit, optionally prefixed with `k`.
impl FromStr for KeyCode {
    type Err = InvalidKeyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digit = s.strip_prefix('k').unwrap_or(s);
        if digit.len() != 1 {
            return Err(InvalidKeyCode);
        }
        let key_id = u8::from_str_radix(digit, 16).map_err(|_| InvalidKeyCode)?;
        Self::try_from(key_id)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}
