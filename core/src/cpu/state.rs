//! CPU state snapshot types and traits

use serde::{Deserialize, Serialize};

use crate::cpu::z80::InterruptMode;

/// Trait for CPU types that can provide and accept state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot);
}

/// Z80 CPU state snapshot
///
/// Holds everything needed to resume execution, including the cycle budget,
/// so a restored CPU continues exactly where the saved one stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Z80State {
    pub a: u8,       // Accumulator
    pub f: u8,       // Flags register
    pub b: u8,       // Register B
    pub c: u8,       // Register C
    pub d: u8,       // Register D
    pub e: u8,       // Register E
    pub h: u8,       // Register H
    pub l: u8,       // Register L
    pub a_prime: u8, // Shadow accumulator
    pub f_prime: u8, // Shadow flags
    pub b_prime: u8, // Shadow B
    pub c_prime: u8, // Shadow C
    pub d_prime: u8, // Shadow D
    pub e_prime: u8, // Shadow E
    pub h_prime: u8, // Shadow H
    pub l_prime: u8, // Shadow L
    pub ix: u16,     // Index register X
    pub iy: u16,     // Index register Y
    pub sp: u16,     // Stack pointer
    pub pc: u16,     // Program counter
    pub i: u8,       // Interrupt vector base
    pub r: u8,       // Refresh counter
    pub iff1: bool,  // Maskable interrupts enabled
    pub iff2: bool,  // IFF1 saved across NMI
    pub im: InterruptMode,
    pub halted: bool,
    pub ei_delay: bool,     // Previous instruction was EI
    pub nmi_previous: bool, // NMI line level at the last boundary
    pub icount: i32,        // Remaining cycle budget (negative = overrun)
}
