mod commands;
mod disasm;
mod executor;

pub use commands::*;
pub use disasm::mnemonic;
pub use executor::*;
