/// Switches for opcodes whose behavior differs between CHIP-8 interpreters.
///
/// The defaults match the instruction set as documented on `Opcode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// 8xy6/8xyE shift Vx in place instead of reading Vy.
    pub shift_uses_vx: bool,
    /// 8xy1/8xy2/8xy3 clear VF.
    pub logic_resets_vf: bool,
    /// Fx55/Fx65 leave I pointing past the last byte transferred.
    pub load_store_increments_i: bool,
    /// Bnnn jumps to nnn + Vx (x taken from the high nibble of nnn) instead of nnn + V0.
    pub jump_uses_vx: bool,
    /// Drawing ends the current frame, so at most one sprite is drawn per frame.
    pub display_wait: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            shift_uses_vx: false,
            logic_resets_vf: false,
            load_store_increments_i: false,
            jump_uses_vx: false,
            display_wait: true,
        }
    }
}
