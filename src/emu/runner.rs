use log::debug;
use std::collections::HashSet;

use super::{StepOutcome, Vm, VmError};
use crate::u4;

pub const DEFAULT_CPU_HZ: f32 = 700.0;
pub const TIMER_HZ: f32 = 60.0;

const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("CPU rate must be a positive number of Hz, got {hz}")]
pub struct InvalidCpuRate {
    pub hz: f32,
}

/// Accepts finite rates above zero.
pub fn check_cpu_hz(hz: f32) -> Result<f32, InvalidCpuRate> {
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(InvalidCpuRate { hz })
    }
}

/// Drives a `Vm` from wall-clock deltas: steps at the CPU rate, ticks timers at 60Hz.
pub struct Runner {
    vm: Vm,
    cpu_time_step: f32,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
    /// Last word skipped as unknown, as (address, word), until taken
    unknown_opcode: Option<(u16, u16)>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RunnerResult {
    HitBreakpoint,
    Ok,
}

impl Runner {
    pub fn new(vm: Vm) -> Self {
        Self {
            vm,
            cpu_time_step: 1.0 / DEFAULT_CPU_HZ,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
            unknown_opcode: None,
        }
    }

    pub fn with_cpu_hz(vm: Vm, cpu_hz: f32) -> Result<Self, InvalidCpuRate> {
        let cpu_hz = check_cpu_hz(cpu_hz)?;
        Ok(Self {
            cpu_time_step: 1.0 / cpu_hz,
            ..Self::new(vm)
        })
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many CPU cycles and timer updates as needed based on the elapsed time `dt`.
    /// Returns early if a frame has to be rendered before the next CPU cycle.
    pub fn update(&mut self, dt: f32) -> Result<RunnerResult, VmError> {
        self.update_with_breakpoints(dt, None)
    }

    /// Like `update` but checks for breakpoints after each CPU cycle.
    pub fn update_with_breakpoints(
        &mut self,
        dt: f32,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<RunnerResult, VmError> {
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.vm.tick_timers();
        }

        while self.cpu_dt_accumulator >= self.cpu_time_step {
            self.cpu_dt_accumulator -= self.cpu_time_step;

            let outcome = self.vm.step()?;

            if let Some(breakpoints) = breakpoints
                && breakpoints.contains(&self.vm.program_counter())
            {
                debug!("Hit breakpoint at {:#05X}", self.vm.program_counter());
                self.cpu_dt_accumulator = 0.0;
                return Ok(RunnerResult::HitBreakpoint);
            }

            let end_frame = match outcome {
                StepOutcome::Drew => self.vm.quirks().display_wait,
                StepOutcome::WaitingForKey => true,
                StepOutcome::UnknownOpcode { address, opcode } => {
                    self.unknown_opcode = Some((address, opcode));
                    false
                }
                StepOutcome::Continue => false,
            };

            if end_frame {
                // If we need to wait for the next frame we stop executing cycles.
                // We clear the accumulator to avoid "catching up" in the next frame.
                self.cpu_dt_accumulator = 0.0;
                break;
            }
        }

        Ok(RunnerResult::Ok)
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.vm.sound_active()
    }

    /// Returns and clears the last unknown word skipped by `update`.
    pub fn take_unknown_opcode(&mut self) -> Option<(u16, u16)> {
        self.unknown_opcode.take()
    }

    pub fn cpu_hz(&self) -> f32 {
        1.0 / self.cpu_time_step
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.vm.set_key(key, pressed)
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Swaps in a fresh machine, dropping any pending time.
    pub fn replace_vm(&mut self, vm: Vm) {
        self.vm = vm;
        self.cpu_dt_accumulator = 0.0;
        self.timer_dt_accumulator = 0.0;
        self.unknown_opcode = None;
    }
}
