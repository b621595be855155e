use clap::Args;

use crate::emu::{DEFAULT_CPU_HZ, InvalidCpuRate, Quirks, Runner, Vm, VmError, check_cpu_hz};

/// Why a runner could not be built from the command line options.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Vm(#[from] VmError),
    #[error(transparent)]
    CpuRate(#[from] InvalidCpuRate),
}

/// Machine options shared by the front-ends.
#[derive(Args, Debug, Clone)]
pub struct MachineArgs {
    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_CPU_HZ, value_parser = parse_cpu_hz)]
    pub cpu_hz: f32,

    /// 8xy6/8xyE shift Vx in place instead of reading Vy
    #[arg(long)]
    pub shift_uses_vx: bool,

    /// 8xy1/8xy2/8xy3 reset VF
    #[arg(long)]
    pub logic_resets_vf: bool,

    /// Fx55/Fx65 advance I past the transferred bytes
    #[arg(long)]
    pub load_store_increments_i: bool,

    /// Bnnn jumps to nnn + Vx instead of nnn + V0
    #[arg(long)]
    pub jump_uses_vx: bool,

    /// Allow more than one sprite draw per frame
    #[arg(long)]
    pub no_display_wait: bool,
}

impl MachineArgs {
    pub fn quirks(&self) -> Quirks {
        Quirks {
            shift_uses_vx: self.shift_uses_vx,
            logic_resets_vf: self.logic_resets_vf,
            load_store_increments_i: self.load_store_increments_i,
            jump_uses_vx: self.jump_uses_vx,
            display_wait: !self.no_display_wait,
        }
    }

    /// Builds a runner around a fresh machine with the program loaded.
    pub fn build_runner(&self, program: &[u8]) -> Result<Runner, SetupError> {
        let mut vm = Vm::with_quirks(self.quirks());
        vm.load(program)?;
        Ok(Runner::with_cpu_hz(vm, self.cpu_hz)?)
    }
}

fn parse_cpu_hz(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("Invalid frequency '{s}': {e}"))?;
    check_cpu_hz(hz).map_err(|e| e.to_string())
}
