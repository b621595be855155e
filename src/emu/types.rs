/// What a single `Vm::step` did, for drivers that pace execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep executing instructions in the current frame.
    Continue,
    /// A sprite was drawn; drivers that emulate the display wait should stop
    /// stepping until the next frame.
    Drew,
    /// `Fx0A` is blocking on a key press and release. The program counter did not move.
    WaitingForKey,
    /// The fetched word is not part of the instruction set. It was skipped.
    UnknownOpcode { address: u16, opcode: u16 },
}

/// Fatal conditions raised while loading or stepping the machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("Program is too large ({size} bytes), max size is {max_size} bytes")]
    ProgramTooLarge { size: usize, max_size: usize },

    #[error("A program can only be loaded before the first step")]
    ProgramAlreadyRunning,

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("Write into the reserved interpreter area at address {address:#06X}")]
    ReservedWrite { address: usize },

    #[error("Register index {index} is out of range (V0-VF)")]
    RegisterOutOfBounds { index: usize },

    #[error("Stack overflow: call at {address:#05X} exceeds the 16-level call stack")]
    StackOverflow { address: u16 },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
