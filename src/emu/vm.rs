use log::{info, trace};

use super::{
    Framebuffer, Keypad, MEMORY_SIZE, Memory, Opcode, PROGRAM_START_ADDRESS, Quirks, Registers,
    StepOutcome, VmError,
};
use crate::u4;

/// CHIP-8 virtual machine state
///
/// The machine is a plain value: whoever owns it drives `step` and
/// `tick_timers`, and hands out shared references to renderers and debuggers.
#[derive(Clone)]
pub struct Vm {
    pub(crate) memory: Memory,
    pub(crate) regs: Registers,
    pub(crate) framebuffer: Framebuffer,
    pub(crate) keypad: Keypad,
    pub(crate) quirks: Quirks,

    /// Key seen pressed by Fx0A, waiting for its release
    pub(crate) wait_release_key: Option<u4>,
    /// Set by the first `step`, after which loading is refused
    pub(crate) started: bool,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Vm {
            memory: Memory::new(),
            regs: Registers::new(),
            framebuffer: Framebuffer::new(),
            keypad: Keypad::new(),
            quirks,
            wait_release_key: None,
            started: false,
        }
    }

    /// Copies a program image to 0x200.
    ///
    /// Must happen before the first `step`; re-create the machine to run another program.
    pub fn load(&mut self, program: &[u8]) -> Result<(), VmError> {
        if self.started {
            return Err(VmError::ProgramAlreadyRunning);
        }

        let max_size = MEMORY_SIZE - PROGRAM_START_ADDRESS;
        if program.len() > max_size {
            return Err(VmError::ProgramTooLarge {
                size: program.len(),
                max_size,
            });
        }

        self.memory.write_range(PROGRAM_START_ADDRESS, program)?;
        info!("Loaded {} byte program at {:#05X}", program.len(), PROGRAM_START_ADDRESS);

        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// A returned error leaves the machine exactly as it was before the call.
    pub fn step(&mut self) -> Result<StepOutcome, VmError> {
        let word = self.fetch()?;
        trace!("{:03X}: {:04X}", self.regs.pc, word);

        let outcome = self.execute(Opcode::decode(word))?;
        self.started = true;
        Ok(outcome)
    }

    /// Decrements the delay and sound timers. Should be called at 60Hz.
    pub fn tick_timers(&mut self) {
        self.regs.delay_timer = self.regs.delay_timer.saturating_sub(1);
        self.regs.sound_timer = self.regs.sound_timer.saturating_sub(1);
    }

    /// True while the sound timer is running, i.e. the beeper should sound.
    pub fn sound_active(&self) -> bool {
        self.regs.sound_timer > 0
    }

    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    /// Replaces the whole keypad snapshot.
    pub fn set_keypad(&mut self, keypad: Keypad) {
        self.keypad = keypad;
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn set_register(&mut self, index: usize, value: u8) -> Result<(), VmError> {
        self.regs.set(index, value)
    }

    pub fn set_address_register(&mut self, value: u16) {
        self.regs.i = value;
    }

    pub fn set_program_counter(&mut self, value: u16) {
        self.regs.pc = value;
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.regs.delay_timer = value;
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.regs.sound_timer = value;
    }

    pub fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), VmError> {
        self.memory.write(addr, value)
    }

    /// Fetches the 16-bit word at the program counter.
    fn fetch(&self) -> Result<u16, VmError> {
        self.memory.read_word(self.regs.pc as usize)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
