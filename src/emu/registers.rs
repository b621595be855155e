use super::{PROGRAM_START_ADDRESS, VmError};
use crate::u4;

pub const STACK_DEPTH: usize = 16;
/// Index of VF, the carry/borrow/collision flag.
pub const FLAG: u4 = u4::MAX;

/// The CPU register file, including the call stack and both timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub v: [u8; 16],
    /// Index register: used for memory operations
    pub i: u16,
    /// Program counter: address of the next instruction to execute
    pub pc: u16,
    /// Number of occupied stack slots (0-16)
    sp: usize,
    /// Addresses of the pending call instructions, read through `call_stack`
    stack: [u16; STACK_DEPTH],
    /// Delay timer: decrements at 60Hz until it reaches 0
    pub delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub sound_timer: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START_ADDRESS as u16,
            sp: 0,
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    pub fn get(&self, index: usize) -> Result<u8, VmError> {
        self.v
            .get(index)
            .copied()
            .ok_or(VmError::RegisterOutOfBounds { index })
    }

    pub fn set(&mut self, index: usize, value: u8) -> Result<(), VmError> {
        let reg = self
            .v
            .get_mut(index)
            .ok_or(VmError::RegisterOutOfBounds { index })?;
        *reg = value;
        Ok(())
    }

    /// The occupied part of the call stack, oldest call first.
    pub fn call_stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub(crate) fn push(&mut self, address: u16) -> Result<(), VmError> {
        let slot = self
            .stack
            .get_mut(self.sp)
            .ok_or(VmError::StackOverflow { address })?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<u16, VmError> {
        let sp = self.sp.checked_sub(1).ok_or(VmError::StackUnderflow)?;
        let address = *self.stack.get(sp).ok_or(VmError::StackUnderflow)?;
        self.sp = sp;
        Ok(address)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
