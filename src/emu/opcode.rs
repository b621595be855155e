use crate::u4;

/// A raw instruction word split into its operand fields.
///
/// | Field    | Bits        | Meaning                     |
/// |----------|-------------|-----------------------------|
/// | `family` | 15-12       | opcode family               |
/// | `x`      | 11-8        | first register operand      |
/// | `y`      | 7-4         | second register operand     |
/// | `n`      | 3-0         | 4-bit immediate / subfamily |
/// | `kk`     | 7-0         | 8-bit immediate             |
/// | `nnn`    | 11-0        | 12-bit address              |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    word: u16,
}

impl Instruction {
    pub const fn new(word: u16) -> Self {
        Self { word }
    }

    pub const fn word(self) -> u16 {
        self.word
    }

    /// The four nibbles, most significant first.
    pub const fn nibbles(self) -> [u8; 4] {
        [
            ((self.word & 0xF000) >> 12) as u8,
            ((self.word & 0x0F00) >> 8) as u8,
            ((self.word & 0x00F0) >> 4) as u8,
            (self.word & 0x000F) as u8,
        ]
    }

    pub const fn family(self) -> u8 {
        self.nibbles()[0]
    }

    pub const fn x(self) -> u4 {
        u4::from_low_bits(self.nibbles()[1])
    }

    pub const fn y(self) -> u4 {
        u4::from_low_bits(self.nibbles()[2])
    }

    pub const fn n(self) -> u4 {
        u4::from_low_bits(self.nibbles()[3])
    }

    pub const fn kk(self) -> u8 {
        (self.word & 0x00FF) as u8
    }

    pub const fn nnn(self) -> u16 {
        self.word & 0x0FFF
    }
}

impl From<u16> for Instruction {
    fn from(word: u16) -> Self {
        Self::new(word)
    }
}

/// CHIP-8 instruction opcodes.
///
/// The fields (x, y, n, kk, nnn) correspond to the operands encoded in the opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0 - Clear the display.
    ClearDisplay,
    /// 00EE - Return from a subroutine.
    Return,

    /// 1nnn - Jump to location nnn.
    Jump { nnn: u16 },
    /// Bnnn - Jump to location nnn + V0.
    JumpWithOffset { x: u4, nnn: u16 },
    /// 2nnn - Call subroutine at nnn.
    Call { nnn: u16 },

    /// 3xkk - Skip next instruction if Vx == kk.
    SkipRegEqualImm { x: u4, kk: u8 },
    /// 4xkk - Skip next instruction if Vx != kk.
    SkipRegNotEqualImm { x: u4, kk: u8 },
    /// 5xy0 - Skip next instruction if Vx == Vy.
    SkipRegEqualReg { x: u4, y: u4 },
    /// 9xy0 - Skip next instruction if Vx != Vy.
    SkipRegNotEqualReg { x: u4, y: u4 },

    /// 6xkk - Set Vx = kk.
    SetRegImm { x: u4, kk: u8 },
    /// 7xkk - Set Vx = Vx + kk, no carry.
    AddRegImm { x: u4, kk: u8 },
    /// 8xyN - Register to register arithmetic.
    Alu { x: u4, y: u4, op: AluOp },

    /// Annn - Set I = nnn.
    SetIndexImm { nnn: u16 },
    /// Fx1E - Set I = I + Vx.
    AddIndexReg { x: u4 },

    /// Cxkk - Set Vx = random byte AND kk.
    Random { x: u4, kk: u8 },
    /// Dxyn - Draw an n-byte sprite from I at (Vx, Vy).
    Draw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip next instruction if key Vx is pressed.
    SkipIfPressed { x: u4 },
    /// ExA1 - Skip next instruction if key Vx is not pressed.
    SkipIfNotPressed { x: u4 },
    /// Fx0A - Wait for a key press and release, store the key in Vx.
    WaitForKey { x: u4 },

    /// Fx07 - Set Vx = delay timer.
    ReadDelayTimer { x: u4 },
    /// Fx15 - Set delay timer = Vx.
    SetDelayTimer { x: u4 },
    /// Fx18 - Set sound timer = Vx.
    SetSoundTimer { x: u4 },

    /// Fx29 - Set I = location of the glyph for digit Vx.
    FontChar { x: u4 },
    /// Fx33 - Store BCD of Vx at I, I+1, I+2.
    Bcd { x: u4 },
    /// Fx55 - Store V0 through Vx starting at I.
    StoreRegs { x: u4 },
    /// Fx65 - Read V0 through Vx starting at I.
    LoadRegs { x: u4 },

    /// Anything else, including 0nnn machine-code calls.
    Unknown(u16),
}

/// Operations of the 8xyN family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// 8xy0 - Vx = Vy
    Set,
    /// 8xy1 - Vx = Vx OR Vy
    Or,
    /// 8xy2 - Vx = Vx AND Vy
    And,
    /// 8xy3 - Vx = Vx XOR Vy
    Xor,
    /// 8xy4 - Vx = Vx + Vy, VF = carry
    Add,
    /// 8xy5 - Vx = Vx - Vy, VF = Vx > Vy
    Sub,
    /// 8xy6 - Vx = Vy SHR 1, VF = shifted out bit
    ShiftRight,
    /// 8xy7 - Vx = Vy - Vx, VF = Vy > Vx
    SubReverse,
    /// 8xyE - Vx = Vy SHL 1, VF = shifted out bit
    ShiftLeft,
}

impl Opcode {
    /// Decode a 16-bit raw opcode. Never fails: unmatched words become `Opcode::Unknown`.
    pub fn decode(word: u16) -> Self {
        Self::from_instruction(Instruction::new(word))
    }

    pub fn from_instruction(ins: Instruction) -> Self {
        let (x, y, n, kk, nnn) = (ins.x(), ins.y(), ins.n(), ins.kk(), ins.nnn());

        match ins.nibbles() {
            [0x0, 0x0, 0xE, 0x0] => Opcode::ClearDisplay,
            [0x0, 0x0, 0xE, 0xE] => Opcode::Return,
            [0x1, _, _, _] => Opcode::Jump { nnn },
            [0x2, _, _, _] => Opcode::Call { nnn },
            [0x3, _, _, _] => Opcode::SkipRegEqualImm { x, kk },
            [0x4, _, _, _] => Opcode::SkipRegNotEqualImm { x, kk },
            [0x5, _, _, 0x0] => Opcode::SkipRegEqualReg { x, y },
            [0x6, _, _, _] => Opcode::SetRegImm { x, kk },
            [0x7, _, _, _] => Opcode::AddRegImm { x, kk },
            [0x8, _, _, sub] => match AluOp::from_nibble(sub) {
                Some(op) => Opcode::Alu { x, y, op },
                None => Opcode::Unknown(ins.word()),
            },
            [0x9, _, _, 0x0] => Opcode::SkipRegNotEqualReg { x, y },
            [0xA, _, _, _] => Opcode::SetIndexImm { nnn },
            [0xB, _, _, _] => Opcode::JumpWithOffset { x, nnn },
            [0xC, _, _, _] => Opcode::Random { x, kk },
            [0xD, _, _, _] => Opcode::Draw { x, y, n },
            [0xE, _, 0x9, 0xE] => Opcode::SkipIfPressed { x },
            [0xE, _, 0xA, 0x1] => Opcode::SkipIfNotPressed { x },
            [0xF, _, 0x0, 0x7] => Opcode::ReadDelayTimer { x },
            [0xF, _, 0x0, 0xA] => Opcode::WaitForKey { x },
            [0xF, _, 0x1, 0x5] => Opcode::SetDelayTimer { x },
            [0xF, _, 0x1, 0x8] => Opcode::SetSoundTimer { x },
            [0xF, _, 0x1, 0xE] => Opcode::AddIndexReg { x },
            [0xF, _, 0x2, 0x9] => Opcode::FontChar { x },
            [0xF, _, 0x3, 0x3] => Opcode::Bcd { x },
            [0xF, _, 0x5, 0x5] => Opcode::StoreRegs { x },
            [0xF, _, 0x6, 0x5] => Opcode::LoadRegs { x },

            _ => Opcode::Unknown(ins.word()),
        }
    }
}

impl AluOp {
    fn from_nibble(nibble: u8) -> Option<Self> {
        Some(match nibble {
            0x0 => AluOp::Set,
            0x1 => AluOp::Or,
            0x2 => AluOp::And,
            0x3 => AluOp::Xor,
            0x4 => AluOp::Add,
            0x5 => AluOp::Sub,
            0x6 => AluOp::ShiftRight,
            0x7 => AluOp::SubReverse,
            0xE => AluOp::ShiftLeft,
            _ => return None,
        })
    }
}
