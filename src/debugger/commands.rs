use clap::{Parser, Subcommand};
use clap_num::maybe_hex;

use crate::{
    emu::{InstructionPreview, VmError},
    u4,
};

#[derive(Parser)]
#[command(multicall = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    #[command(visible_alias = "r")]
    Run,

    #[command(visible_alias = "p")]
    Pause,

    #[command(visible_alias = "s")]
    Step {
        #[arg(default_value = "1", value_parser = maybe_hex::<u16>)]
        count: u16,
    },

    #[command(visible_alias = "b")]
    Breakpoint {
        #[command(subcommand)]
        action: BreakpointAction,
    },

    Set {
        #[arg(value_parser = parse_set_target)]
        target: SetTarget,
        #[arg(value_parser = maybe_hex::<u16>)]
        value: u16,
    },

    #[command(visible_alias = "m")]
    Mem {
        #[arg(default_value = "0x200", value_parser = maybe_hex::<u16>)]
        start: u16,
        #[arg(default_value = "64", value_parser = maybe_hex::<u16>)]
        len: u16,
    },

    #[command(visible_alias = "d")]
    Disasm {
        #[arg(default_value = "16", value_parser = maybe_hex::<u16>)]
        count: u16,
    },

    Reset,

    #[command(visible_alias = "q")]
    Quit,
}

pub enum CommandResult {
    Ok,
    /// Steps completed; lists the unknown words skipped along the way as (address, word)
    Stepped { unknown_opcodes: Vec<(u16, u16)> },
    Breakpoints(Vec<u16>),
    MemDump { data: Vec<u8>, offset: u16 },
    Disasm { instructions: Vec<InstructionPreview> },
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Error while executing cpu instruction: {0}")]
    Vm(#[from] VmError),
    #[error("Value {value:#X} out of range for {target}")]
    ValueOutOfRange { target: &'static str, value: u16 },
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum BreakpointAction {
    #[command(visible_alias = "s")]
    Set {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "c")]
    Clear {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "l")]
    List,

    #[command(visible_alias = "ca")]
    ClearAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetTarget {
    V(u4),
    I,
    Pc,
    DelayTimer,
    SoundTimer,
}

fn parse_set_target(s: &str) -> Result<SetTarget, String> {
    let lower = s.to_lowercase();

    match lower.as_str() {
        "index" | "i" => Ok(SetTarget::I),
        "pc" => Ok(SetTarget::Pc),
        "dt" => Ok(SetTarget::DelayTimer),
        "st" => Ok(SetTarget::SoundTimer),

        _ if lower.starts_with('v') => u8::from_str_radix(&lower[1..], 16)
            .ok()
            .and_then(u4::try_new)
            .map(SetTarget::V)
            .ok_or_else(|| format!("Invalid register: '{}'", s)),

        _ => Err(format!("Unknown set target: '{}'", s)),
    }
}
