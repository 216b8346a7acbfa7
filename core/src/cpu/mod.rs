/// Generic CPU interface
pub trait Cpu: CpuStateTrait {
    /// Power-on / RESET line
    fn reset(&mut self);

    /// Query if CPU is halted internally (HALT instruction)
    fn is_sleeping(&self) -> bool;

    /// Address of the next instruction
    fn pc(&self) -> u16;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, Z80State};

// Z80 CPU
pub mod z80;
pub use z80::{InterruptMode, Z80, Z80Bus};
