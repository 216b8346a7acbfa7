use std::collections::VecDeque;

use mtx_core::core::{Bus, InterruptLine, InterruptState};
use mtx_core::core::daisy::FLOATING_VECTOR;
use mtx_core::cpu::Z80;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory with cycle-by-cycle recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
    In,
    Out,
    /// The CPU charged T-states (recorded as `data`, `addr` unused).
    Elapse,
    /// Interrupt acknowledge; `data` is the vector supplied.
    Ack,
    Reti,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

/// Flat 64KB bus that records every access, with a scriptable interrupt
/// line.
#[derive(Clone)]
pub struct TracingBus {
    pub memory: Box<[u8; 0x10000]>,
    pub cycles: Vec<BusCycle>,
    /// Values handed to `IN`, oldest first. An empty queue reads 0xFF.
    pub port_queue: VecDeque<(u16, u8)>,

    pub irq: bool,
    pub nmi: bool,
    pub vector: u8,
    /// Drop INT once the request has been acknowledged.
    pub irq_clears_on_ack: bool,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            cycles: Vec::new(),
            port_queue: VecDeque::new(),
            irq: false,
            nmi: false,
            vector: FLOATING_VECTOR,
            irq_clears_on_ack: true,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    /// Total T-states recorded since the last clear.
    pub fn t_states(&self) -> u64 {
        self.cycles
            .iter()
            .filter(|c| c.op == BusOp::Elapse)
            .map(|c| c.data as u64)
            .sum()
    }

    fn record(&mut self, addr: u16, data: u8, op: BusOp) {
        self.cycles.push(BusCycle { addr, data, op });
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.record(addr, data, BusOp::Read);
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.record(addr, data, BusOp::Write);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        let data = self.port_queue.pop_front().map_or(0xFF, |(_, value)| value);
        self.record(port, data, BusOp::In);
        data
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.record(port, data, BusOp::Out);
    }

    fn elapse(&mut self, t_states: u32) {
        // Longest single charge is 23 T, well inside a byte
        self.record(0, t_states as u8, BusOp::Elapse);
    }
}

impl InterruptLine for TracingBus {
    fn check_interrupts(&self) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
        }
    }

    fn acknowledge(&mut self) -> u8 {
        if self.irq_clears_on_ack {
            self.irq = false;
        }
        let vector = self.vector;
        self.record(0, vector, BusOp::Ack);
        vector
    }

    fn reti(&mut self) -> bool {
        self.record(0, 0, BusOp::Reti);
        false
    }
}

// --- Z80 JSON test vector types (SingleStepTests/z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// One entry per clock: address, data, pin activity.
    pub cycles: Vec<(Option<u16>, Option<u8>, String)>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    pub iff1: u8,
    pub iff2: u8,
    #[serde(default)]
    pub ei: u8,
    pub ram: Vec<(u16, u8)>,
}

impl Z80CpuState {
    /// Load registers into a CPU. Interrupt mode values other than 0-2
    /// select mode 0.
    pub fn apply(&self, cpu: &mut Z80) {
        use mtx_core::cpu::InterruptMode;

        cpu.a = self.a;
        cpu.f = self.f;
        cpu.b = self.b;
        cpu.c = self.c;
        cpu.d = self.d;
        cpu.e = self.e;
        cpu.h = self.h;
        cpu.l = self.l;
        cpu.i = self.i;
        cpu.r = self.r;
        cpu.ix = self.ix;
        cpu.iy = self.iy;
        cpu.sp = self.sp;
        cpu.pc = self.pc;
        cpu.iff1 = self.iff1 != 0;
        cpu.iff2 = self.iff2 != 0;
        cpu.ei_delay = self.ei != 0;
        cpu.halted = false;
        cpu.im = match self.im {
            1 => InterruptMode::Im1,
            2 => InterruptMode::Im2,
            _ => InterruptMode::Im0,
        };

        cpu.a_prime = (self.af_prime >> 8) as u8;
        cpu.f_prime = self.af_prime as u8;
        cpu.b_prime = (self.bc_prime >> 8) as u8;
        cpu.c_prime = self.bc_prime as u8;
        cpu.d_prime = (self.de_prime >> 8) as u8;
        cpu.e_prime = self.de_prime as u8;
        cpu.h_prime = (self.hl_prime >> 8) as u8;
        cpu.l_prime = self.hl_prime as u8;
    }

    /// First register that differs from `cpu`, as "NAME (got X exp Y)".
    pub fn compare(&self, cpu: &Z80) -> Option<String> {
        let pairs: [(&str, u16, u16); 18] = [
            ("A", cpu.a as u16, self.a as u16),
            ("F", cpu.f as u16, self.f as u16),
            ("B", cpu.b as u16, self.b as u16),
            ("C", cpu.c as u16, self.c as u16),
            ("D", cpu.d as u16, self.d as u16),
            ("E", cpu.e as u16, self.e as u16),
            ("H", cpu.h as u16, self.h as u16),
            ("L", cpu.l as u16, self.l as u16),
            ("I", cpu.i as u16, self.i as u16),
            ("R", cpu.r as u16, self.r as u16),
            ("IX", cpu.ix, self.ix),
            ("IY", cpu.iy, self.iy),
            ("SP", cpu.sp, self.sp),
            ("PC", cpu.pc, self.pc),
            ("AF'", u16::from_be_bytes([cpu.a_prime, cpu.f_prime]), self.af_prime),
            ("BC'", u16::from_be_bytes([cpu.b_prime, cpu.c_prime]), self.bc_prime),
            ("DE'", u16::from_be_bytes([cpu.d_prime, cpu.e_prime]), self.de_prime),
            ("HL'", u16::from_be_bytes([cpu.h_prime, cpu.l_prime]), self.hl_prime),
        ];
        pairs
            .iter()
            .find(|(_, got, exp)| got != exp)
            .map(|(name, got, exp)| format!("{name} (got 0x{got:X} exp 0x{exp:X})"))
    }
}
