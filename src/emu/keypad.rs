use crate::u4;

/// Snapshot of the 16-key hex keypad (true = pressed). Defaults to all released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; 16],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: [bool; 16]) -> Self {
        Self { keys }
    }

    pub fn set(&mut self, key: u4, pressed: bool) {
        self.keys[key] = pressed;
    }

    pub fn is_pressed(&self, key: u4) -> bool {
        self.keys[key]
    }

    /// Key lookup for a register value. Values above 0xF name no key and are never pressed.
    pub fn is_value_pressed(&self, value: u8) -> bool {
        u4::try_new(value).is_some_and(|key| self.keys[key])
    }

    /// Lowest-numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u4> {
        self.keys
            .iter()
            .position(|&pressed| pressed)
            .map(|key| u4::from_low_bits(key as u8))
    }

    pub fn keys(&self) -> &[bool; 16] {
        &self.keys
    }
}
