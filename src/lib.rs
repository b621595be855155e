pub mod config;
pub mod debugger;
pub mod emu;
mod nibble;

pub use nibble::u4;
