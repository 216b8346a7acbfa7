pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::{
        Bus, Component, ConfigError, DaisyChain, DaisyDevices, InterruptLine, InterruptSource,
        InterruptState, Machine, MachineError,
    };
    pub use crate::cpu::{Cpu, CpuStateTrait, InterruptMode, Z80, Z80Bus, Z80State};
    pub use crate::device::{Ctc, Dart};
}
