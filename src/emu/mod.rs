mod execute;
mod font;
mod framebuffer;
mod inspect;
mod keypad;
mod memory;
mod opcode;
mod quirks;
mod registers;
mod runner;
mod types;
mod vm;

pub use font::*;
pub use framebuffer::*;
pub use inspect::*;
pub use keypad::*;
pub use memory::*;
pub use opcode::*;
pub use quirks::*;
pub use registers::*;
pub use runner::*;
pub use types::*;
pub use vm::*;
