use log::warn;

use super::{AluOp, DISPLAY_X, DISPLAY_Y, FLAG, Opcode, StepOutcome, Vm, VmError, glyph_address};
use crate::u4;

/// Longest sprite a Dxyn can draw.
const MAX_SPRITE_ROWS: usize = 15;

impl Vm {
    /// Applies `opcode` to the machine and moves the program counter.
    ///
    /// Fallible work happens before any state is written, so an error never
    /// leaves a half-executed instruction behind.
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<StepOutcome, VmError> {
        let pc = self.regs.pc;
        let mut next_pc = pc.wrapping_add(2);
        let skip = pc.wrapping_add(4);
        let mut outcome = StepOutcome::Continue;

        match opcode {
            Opcode::ClearDisplay => {
                self.framebuffer.clear();
            }
            Opcode::Return => {
                // The stack holds the address of the call itself
                next_pc = self.regs.pop()?.wrapping_add(2);
            }
            Opcode::Jump { nnn } => {
                next_pc = nnn;
            }
            Opcode::JumpWithOffset { x, nnn } => {
                let offset = if self.quirks.jump_uses_vx {
                    self.regs.v[x]
                } else {
                    self.regs.v[0]
                };
                next_pc = nnn.wrapping_add(offset.into());
            }
            Opcode::Call { nnn } => {
                self.regs.push(pc)?;
                next_pc = nnn;
            }
            Opcode::SkipRegEqualImm { x, kk } => {
                if self.regs.v[x] == kk {
                    next_pc = skip;
                }
            }
            Opcode::SkipRegNotEqualImm { x, kk } => {
                if self.regs.v[x] != kk {
                    next_pc = skip;
                }
            }
            Opcode::SkipRegEqualReg { x, y } => {
                if self.regs.v[x] == self.regs.v[y] {
                    next_pc = skip;
                }
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                if self.regs.v[x] != self.regs.v[y] {
                    next_pc = skip;
                }
            }
            Opcode::SetRegImm { x, kk } => {
                self.regs.v[x] = kk;
            }
            Opcode::AddRegImm { x, kk } => {
                self.regs.v[x] = self.regs.v[x].wrapping_add(kk);
            }
            Opcode::Alu { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::SetIndexImm { nnn } => {
                self.regs.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.regs.i = self.regs.i.wrapping_add(self.regs.v[x].into());
            }
            Opcode::Random { x, kk } => {
                let rand_byte: u8 = rand::random();
                self.regs.v[x] = rand_byte & kk;
            }
            Opcode::Draw { x, y, n } => {
                self.execute_draw(x, y, n)?;
                outcome = StepOutcome::Drew;
            }
            Opcode::SkipIfPressed { x } => {
                if self.keypad.is_value_pressed(self.regs.v[x]) {
                    next_pc = skip;
                }
            }
            Opcode::SkipIfNotPressed { x } => {
                if !self.keypad.is_value_pressed(self.regs.v[x]) {
                    next_pc = skip;
                }
            }
            Opcode::WaitForKey { x } => {
                if !self.execute_wait_for_key(x) {
                    // Repeat this instruction until a key is released
                    next_pc = pc;
                    outcome = StepOutcome::WaitingForKey;
                }
            }
            Opcode::ReadDelayTimer { x } => {
                self.regs.v[x] = self.regs.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.regs.delay_timer = self.regs.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.regs.sound_timer = self.regs.v[x];
            }
            Opcode::FontChar { x } => {
                self.regs.i = glyph_address(self.regs.v[x]);
            }
            Opcode::Bcd { x } => {
                let value = self.regs.v[x];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.memory.write_range(self.regs.i as usize, &digits)?;
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                self.memory
                    .write_range(self.regs.i as usize, &self.regs.v[..count])?;
                self.advance_index(count);
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let data = self.memory.read_range(self.regs.i as usize, count)?;
                self.regs.v[..count].copy_from_slice(data);
                self.advance_index(count);
            }
            Opcode::Unknown(opcode) => {
                warn!("Skipping unknown opcode {opcode:#06X} at {pc:#05X}");
                outcome = StepOutcome::UnknownOpcode { address: pc, opcode };
            }
        };

        self.regs.pc = next_pc;
        Ok(outcome)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: AluOp) {
        let v = &mut self.regs.v;

        match op {
            AluOp::Set => v[x] = v[y],
            AluOp::Or => {
                v[x] |= v[y];
                self.reset_flag_after_logic();
            }
            AluOp::And => {
                v[x] &= v[y];
                self.reset_flag_after_logic();
            }
            AluOp::Xor => {
                v[x] ^= v[y];
                self.reset_flag_after_logic();
            }
            AluOp::Add => {
                let (res, carry) = v[x].overflowing_add(v[y]);
                v[x] = res;
                v[FLAG] = carry.into();
            }
            AluOp::Sub => {
                let no_borrow = v[x] > v[y];
                v[x] = v[x].wrapping_sub(v[y]);
                v[FLAG] = no_borrow.into();
            }
            AluOp::SubReverse => {
                let no_borrow = v[y] > v[x];
                v[x] = v[y].wrapping_sub(v[x]);
                v[FLAG] = no_borrow.into();
            }
            AluOp::ShiftRight => {
                let src = if self.quirks.shift_uses_vx { v[x] } else { v[y] };
                v[x] = src >> 1;
                v[FLAG] = src & 1;
            }
            AluOp::ShiftLeft => {
                let src = if self.quirks.shift_uses_vx { v[x] } else { v[y] };
                v[x] = src << 1;
                v[FLAG] = src >> 7;
            }
        }
    }

    fn reset_flag_after_logic(&mut self) {
        if self.quirks.logic_resets_vf {
            self.regs.v[FLAG] = 0;
        }
    }

    /// XORs an n-row sprite from I onto the screen at (Vx, Vy).
    ///
    /// Columns wrap around the right edge; rows below the bottom edge are clipped.
    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<(), VmError> {
        let rows = usize::from(n);
        let mut sprite = [0u8; MAX_SPRITE_ROWS];
        sprite[..rows].copy_from_slice(self.memory.read_range(self.regs.i as usize, rows)?);

        let x_pos = self.regs.v[x] as usize;
        let y_pos = self.regs.v[y] as usize;
        self.regs.v[FLAG] = 0;

        let mut any_erased = false;
        for (row, sprite_byte) in sprite[..rows].iter().enumerate() {
            let py = y_pos + row;
            if py >= DISPLAY_Y {
                break;
            }

            for col in 0..8 {
                // If current sprite bit is non-zero
                if sprite_byte & (0x80 >> col) != 0 {
                    let px = (x_pos + col) % DISPLAY_X;
                    any_erased |= self.framebuffer.flip(px, py);
                }
            }
        }

        self.regs.v[FLAG] = any_erased.into();
        Ok(())
    }

    /// Returns true once a key has been pressed and released, with the key stored in Vx.
    fn execute_wait_for_key(&mut self, x: u4) -> bool {
        if let Some(key) = self.wait_release_key
            && !self.keypad.is_pressed(key)
        {
            // The key we were waiting for has been released
            self.regs.v[x] = key.get();
            self.wait_release_key = None;
            return true;
        }

        if self.wait_release_key.is_none() {
            self.wait_release_key = self.keypad.first_pressed();
        }

        false
    }

    fn advance_index(&mut self, count: usize) {
        if self.quirks.load_store_increments_i {
            self.regs.i = self.regs.i.wrapping_add(count as u16);
        }
    }
}
