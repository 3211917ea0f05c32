use crate::error::{Chip8Error, Result};
use crate::KEY_COUNT;

/// Host input symbols indexed by keypad key, so `map[0xA]` is the symbol that presses key A
pub type KeyMap = [u32; KEY_COUNT];

/// Hex keypad layout on a QWERTY keyboard, as character labels
///
/// ```text
/// 1 2 3 C        1 2 3 4
/// 4 5 6 D   <-   q w e r
/// 7 8 9 E        a s d f
/// A 0 B F        z x c v
/// ```
pub const LABEL_MAP: KeyMap = [
    'x' as u32, // 0
    '1' as u32, // 1
    '2' as u32, // 2
    '3' as u32, // 3
    'q' as u32, // 4
    'w' as u32, // 5
    'e' as u32, // 6
    'a' as u32, // 7
    's' as u32, // 8
    'd' as u32, // 9
    'z' as u32, // A
    'c' as u32, // B
    '4' as u32, // C
    'r' as u32, // D
    'f' as u32, // E
    'v' as u32, // F
];

/// The same layout as macOS virtual keycodes
pub const SCANCODE_MAP: KeyMap = [
    7,  // X -> 0
    18, // 1 -> 1
    19, // 2 -> 2
    20, // 3 -> 3
    12, // Q -> 4
    13, // W -> 5
    14, // E -> 6
    0,  // A -> 7
    1,  // S -> 8
    2,  // D -> 9
    6,  // Z -> A
    8,  // C -> B
    21, // 4 -> C
    15, // R -> D
    3,  // F -> E
    9,  // V -> F
];

pub struct Keypad {
    pub(crate) keys: [bool; KEY_COUNT],
    map: KeyMap,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
            map: LABEL_MAP,
        }
    }

    pub fn set_mapping(&mut self, map: KeyMap) {
        self.map = map;
    }

    /// Find the key bound to a host symbol, first match wins
    pub fn map_symbol(&self, symbol: u32) -> Option<u8> {
        self.map
            .iter()
            .position(|&bound| bound == symbol)
            .map(|key| key as u8)
    }

    fn check(key: usize) -> Result<usize> {
        if key < KEY_COUNT {
            Ok(key)
        } else {
            Err(Chip8Error::KeyOutOfBounds { key })
        }
    }

    pub fn keydown(&mut self, key: usize) -> Result<()> {
        self.keys[Self::check(key)?] = true;
        Ok(())
    }

    pub fn keyup(&mut self, key: usize) -> Result<()> {
        self.keys[Self::check(key)?] = false;
        Ok(())
    }

    pub fn is_key_down(&self, key: usize) -> Result<bool> {
        Ok(self.keys[Self::check(key)?])
    }
}
