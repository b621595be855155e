use super::{FONT, FONT_END_ADDRESS, FONT_START_ADDRESS, VmError};

pub const MEMORY_SIZE: usize = 4096;
/// Programs are loaded here and execution starts here.
pub const PROGRAM_START_ADDRESS: usize = 0x200;

/// 4KB of byte-addressable memory with the font preloaded.
///
/// Every access is bounds checked. Addresses below `PROGRAM_START_ADDRESS`
/// belong to the interpreter and reject writes once the font is in place.
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        Self { bytes }
    }

    pub fn read(&self, addr: usize) -> Result<u8, VmError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(VmError::MemoryOutOfBounds { address: addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), VmError> {
        Self::check_writable(addr, 1)?;
        self.bytes[addr] = value;
        Ok(())
    }

    /// Big-endian 16-bit word at `addr` and `addr + 1`.
    pub fn read_word(&self, addr: usize) -> Result<u16, VmError> {
        let bytes = self.read_range(addr, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_range(&self, addr: usize, len: usize) -> Result<&[u8], VmError> {
        let end = addr.checked_add(len).filter(|&end| end <= MEMORY_SIZE);

        match end {
            Some(end) => Ok(&self.bytes[addr..end]),
            // Report the first address that falls outside memory
            None => Err(VmError::MemoryOutOfBounds {
                address: addr.max(MEMORY_SIZE),
            }),
        }
    }

    /// Writes all of `data` starting at `addr`, or nothing at all.
    pub fn write_range(&mut self, addr: usize, data: &[u8]) -> Result<(), VmError> {
        Self::check_writable(addr, data.len())?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8; MEMORY_SIZE] {
        &self.bytes
    }

    fn check_writable(addr: usize, len: usize) -> Result<(), VmError> {
        if addr < PROGRAM_START_ADDRESS {
            return Err(VmError::ReservedWrite { address: addr });
        }

        match addr.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(()),
            _ => Err(VmError::MemoryOutOfBounds {
                address: addr.max(MEMORY_SIZE),
            }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_loaded_at_zero() {
        let memory = Memory::new();
        assert_eq!(memory.read_range(0, 5).unwrap(), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        // Glyph F starts at 15 * 5
        assert_eq!(memory.read(75).unwrap(), 0xF0);
        assert_eq!(memory.read(79).unwrap(), 0x80);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let memory = Memory::new();
        assert_eq!(memory.read(4095), Ok(0));
        assert_eq!(
            memory.read(4096),
            Err(VmError::MemoryOutOfBounds { address: 4096 })
        );
        assert_eq!(
            memory.read_word(4095),
            Err(VmError::MemoryOutOfBounds { address: 4096 })
        );
    }

    #[test]
    fn font_region_is_read_only() {
        let mut memory = Memory::new();
        assert_eq!(
            memory.write(0x1FF, 1),
            Err(VmError::ReservedWrite { address: 0x1FF })
        );
        assert_eq!(memory.read(0), Ok(0xF0));
        assert!(memory.write(0x200, 1).is_ok());
    }

    #[test]
    fn partial_range_write_is_rejected_whole() {
        let mut memory = Memory::new();
        let result = memory.write_range(4094, &[1, 2, 3]);

        assert_eq!(result, Err(VmError::MemoryOutOfBounds { address: 4096 }));
        assert_eq!(memory.read_range(4094, 2).unwrap(), &[0, 0]);
    }

    #[test]
    fn words_are_big_endian() {
        let mut memory = Memory::new();
        memory.write_range(0x300, &[0x12, 0x34]).unwrap();
        assert_eq!(memory.read_word(0x300), Ok(0x1234));
    }
}
