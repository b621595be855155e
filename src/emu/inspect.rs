//! Read-only views of the machine for renderers and debuggers.

use super::{Framebuffer, Instruction, Keypad, MEMORY_SIZE, Opcode, Registers, Vm, VmError};

/// A raw instruction word and the address it was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionPreview {
    pub address: u16,
    pub word: u16,
}

impl InstructionPreview {
    pub fn instruction(&self) -> Instruction {
        Instruction::new(self.word)
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::decode(self.word)
    }
}

impl Vm {
    /// The next `count` instruction words starting at the program counter.
    pub fn upcoming(&self, count: usize) -> Vec<InstructionPreview> {
        self.instructions_at(self.regs.pc, count)
    }

    /// Up to `count` consecutive words starting at `address`, stopping at the end of memory.
    pub fn instructions_at(&self, address: u16, count: usize) -> Vec<InstructionPreview> {
        (0..count)
            .map(|idx| address as usize + idx * 2)
            .map_while(|addr| {
                let word = self.memory.read_word(addr).ok()?;
                Some(InstructionPreview {
                    address: addr as u16,
                    word,
                })
            })
            .collect()
    }

    /// Copy of the whole register file.
    pub fn registers(&self) -> Registers {
        self.regs
    }

    pub fn register(&self, index: usize) -> Result<u8, VmError> {
        self.regs.get(index)
    }

    pub fn address_register(&self) -> u16 {
        self.regs.i
    }

    pub fn program_counter(&self) -> u16 {
        self.regs.pc
    }

    pub fn peek(&self, addr: usize) -> Result<u8, VmError> {
        self.memory.read(addr)
    }

    /// Up to `len` bytes from `addr`, cut short at the end of memory.
    pub fn peek_range(&self, addr: usize, len: usize) -> &[u8] {
        let start = addr.min(MEMORY_SIZE);
        let end = addr.saturating_add(len).min(MEMORY_SIZE);
        &self.memory.as_bytes()[start..end]
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }
}
