use std::fmt;

use crate::emu::{AluOp, Opcode, Quirks};

/// Mnemonic for `opcode` as the machine would execute it under `quirks`.
pub fn mnemonic(opcode: Opcode, quirks: Quirks) -> String {
    match opcode {
        Opcode::JumpWithOffset { x, nnn } if quirks.jump_uses_vx => {
            format!("JP   V{x:X}, {nnn:03X}")
        }
        _ => opcode.to_string(),
    }
}

/// Quirk-agnostic text: Bnnn is always shown in its V0 form, use `mnemonic` for the
/// variant that follows the machine's quirks.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::ClearDisplay => write!(f, "CLS"),
            Opcode::Return => write!(f, "RET"),
            Opcode::Jump { nnn } => write!(f, "JP   {nnn:03X}"),
            Opcode::JumpWithOffset { nnn, .. } => write!(f, "JP   V0, {nnn:03X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:03X}"),
            Opcode::SkipRegEqualImm { x, kk } => write!(f, "SE   V{x:X}, {kk:02X}"),
            Opcode::SkipRegNotEqualImm { x, kk } => write!(f, "SNE  V{x:X}, {kk:02X}"),
            Opcode::SkipRegEqualReg { x, y } => write!(f, "SE   V{x:X}, V{y:X}"),
            Opcode::SkipRegNotEqualReg { x, y } => write!(f, "SNE  V{x:X}, V{y:X}"),
            Opcode::SetRegImm { x, kk } => write!(f, "LD   V{x:X}, {kk:02X}"),
            Opcode::AddRegImm { x, kk } => write!(f, "ADD  V{x:X}, {kk:02X}"),
            Opcode::Alu { x, y, op } => write!(f, "{:<4} V{x:X}, V{y:X}", op.mnemonic()),
            Opcode::SetIndexImm { nnn } => write!(f, "LD   I, {nnn:03X}"),
            Opcode::AddIndexReg { x } => write!(f, "ADD  I, V{x:X}"),
            Opcode::Random { x, kk } => write!(f, "RND  V{x:X}, {kk:02X}"),
            Opcode::Draw { x, y, n } => write!(f, "DRW  V{x:X}, V{y:X}, {n:X}"),
            Opcode::SkipIfPressed { x } => write!(f, "SKP  V{x:X}"),
            Opcode::SkipIfNotPressed { x } => write!(f, "SKNP V{x:X}"),
            Opcode::WaitForKey { x } => write!(f, "LD   V{x:X}, K"),
            Opcode::ReadDelayTimer { x } => write!(f, "LD   V{x:X}, DT"),
            Opcode::SetDelayTimer { x } => write!(f, "LD   DT, V{x:X}"),
            Opcode::SetSoundTimer { x } => write!(f, "LD   ST, V{x:X}"),
            Opcode::FontChar { x } => write!(f, "LD   F, V{x:X}"),
            Opcode::Bcd { x } => write!(f, "LD   B, V{x:X}"),
            Opcode::StoreRegs { x } => write!(f, "LD   [I], V{x:X}"),
            Opcode::LoadRegs { x } => write!(f, "LD   V{x:X}, [I]"),
            Opcode::Unknown(word) => write!(f, "DW   {word:04X}"),
        }
    }
}

impl AluOp {
    fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Set => "LD",
            AluOp::Or => "OR",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::ShiftRight => "SHR",
            AluOp::SubReverse => "SUBN",
            AluOp::ShiftLeft => "SHL",
        }
    }
}
