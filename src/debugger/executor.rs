use log::info;
use std::collections::HashSet;

use super::commands::{BreakpointAction, Command, CommandError, CommandResult, SetTarget};
use crate::emu::{Framebuffer, Keypad, Registers, Runner, RunnerResult, StepOutcome, Vm, VmError};

pub struct Executor {
    is_running: bool,
    runner: Runner,
    breakpoints: HashSet<u16>,
    /// Program image kept around so `reset` can reload it
    program: Vec<u8>,
}

impl Executor {
    pub fn new(runner: Runner, program: Vec<u8>) -> Self {
        Self {
            is_running: false,
            runner,
            breakpoints: HashSet::new(),
            program,
        }
    }

    pub fn poll(&mut self, dt: f32) -> Result<RunnerResult, VmError> {
        if !self.is_running {
            return Ok(RunnerResult::Ok);
        }

        let result = self
            .runner
            .update_with_breakpoints(dt, Some(&self.breakpoints));

        if matches!(result, Err(_) | Ok(RunnerResult::HitBreakpoint)) {
            self.is_running = false;
        }

        result
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Run => {
                self.is_running = true;
                Ok(CommandResult::Ok)
            }
            Command::Pause => {
                self.pause();
                Ok(CommandResult::Ok)
            }
            Command::Step { count } => self.execute_step(count),
            Command::Breakpoint { action } => Ok(self.handle_breakpoint(action)),
            Command::Set { target, value } => self.handle_set(target, value),
            Command::Mem { start, len } => Ok(CommandResult::MemDump {
                data: self.vm().peek_range(start.into(), len.into()).to_vec(),
                offset: start,
            }),
            Command::Disasm { count } => Ok(CommandResult::Disasm {
                instructions: self.vm().upcoming(count.into()),
            }),
            Command::Reset => self.execute_reset(),
            Command::Quit => Ok(CommandResult::Quit),
        }
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn vm(&self) -> &Vm {
        self.runner.vm()
    }

    pub fn registers(&self) -> Registers {
        self.vm().registers()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        self.vm().framebuffer()
    }

    pub fn keypad(&self) -> &Keypad {
        self.vm().keypad()
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    pub fn breakpoints(&self) -> &HashSet<u16> {
        &self.breakpoints
    }

    /// Steps ignoring breakpoints; unknown opcodes are skipped like in run mode.
    fn execute_step(&mut self, count: u16) -> Result<CommandResult, CommandError> {
        let mut unknown_opcodes = Vec::new();
        for _ in 0..count {
            if let StepOutcome::UnknownOpcode { address, opcode } = self.runner.vm_mut().step()? {
                unknown_opcodes.push((address, opcode));
            }
        }
        Ok(CommandResult::Stepped { unknown_opcodes })
    }

    fn execute_reset(&mut self) -> Result<CommandResult, CommandError> {
        let mut vm = Vm::with_quirks(self.vm().quirks());
        vm.load(&self.program)?;

        self.runner.replace_vm(vm);
        self.is_running = false;
        info!("Machine reset");

        Ok(CommandResult::Ok)
    }

    fn handle_breakpoint(&mut self, action: BreakpointAction) -> CommandResult {
        match action {
            BreakpointAction::Set { addr } => {
                self.breakpoints.insert(addr);
            }
            BreakpointAction::Clear { addr } => {
                self.breakpoints.remove(&addr);
            }
            BreakpointAction::ClearAll => {
                self.breakpoints.clear();
            }
            BreakpointAction::List => {
                let mut bps: Vec<u16> = self.breakpoints.iter().copied().collect();
                bps.sort();
                return CommandResult::Breakpoints(bps);
            }
        };

        CommandResult::Ok
    }

    fn handle_set(&mut self, target: SetTarget, value: u16) -> Result<CommandResult, CommandError> {
        let vm = self.runner.vm_mut();
        let byte = |target| {
            u8::try_from(value).map_err(|_| CommandError::ValueOutOfRange { target, value })
        };

        match target {
            SetTarget::V(reg) => vm.set_register(reg.into(), byte("a V register")?)?,
            SetTarget::I => vm.set_address_register(value),
            SetTarget::Pc => vm.set_program_counter(value),
            SetTarget::DelayTimer => vm.set_delay_timer(byte("the delay timer")?),
            SetTarget::SoundTimer => vm.set_sound_timer(byte("the sound timer")?),
        }

        Ok(CommandResult::Ok)
    }
}
