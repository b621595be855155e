use std::fmt;
use std::ops::{Index, IndexMut};

/// A 4-bit unsigned integer, used for register and key indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub struct u4(u8);

impl u4 {
    pub const MAX: u4 = u4(0x0F);

    /// Keeps the low four bits of `value`.
    pub const fn from_low_bits(value: u8) -> Self {
        Self(value & 0x0F)
    }

    /// Returns `None` if the value does not fit in four bits.
    pub const fn try_new(value: u8) -> Option<Self> {
        if value <= 0x0F { Some(Self(value)) } else { None }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u4> for usize {
    fn from(v: u4) -> usize {
        v.0 as usize
    }
}

impl From<u4> for u8 {
    fn from(v: u4) -> u8 {
        v.0
    }
}

impl fmt::UpperHex for u4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl<T> Index<u4> for [T; 16] {
    type Output = T;

    fn index(&self, index: u4) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<u4> for [T; 16] {
    fn index_mut(&mut self, index: u4) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_rejects_values_above_fifteen() {
        assert_eq!(u4::try_new(0x0F), Some(u4::MAX));
        assert_eq!(u4::try_new(0x10), None);
    }

    #[test]
    fn from_low_bits_masks() {
        assert_eq!(u4::from_low_bits(0xAB).get(), 0x0B);
    }

    #[test]
    fn indexes_sixteen_element_arrays() {
        let mut regs = [0u8; 16];
        regs[u4::from_low_bits(3)] = 7;
        assert_eq!(regs[3], 7);
        assert_eq!(regs[u4::from_low_bits(3)], 7);
    }
}
