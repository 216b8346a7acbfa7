#![allow(dead_code)]

use mtx_core::core::{Bus, InterruptLine, InterruptState};

/// Minimal bus for testing: flat 64KB read/write memory, a port latch per
/// low address byte, and a mock interrupt arbiter.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    /// Value returned by `io_read`, indexed by the low port byte.
    pub ports: [u8; 0x100],
    /// Every port write: (full 16-bit port, data, T-states elapsed so far).
    pub io_writes: Vec<(u16, u8, u64)>,
    /// Every port read: (full 16-bit port, T-states elapsed so far).
    pub io_reads: Vec<(u16, u64)>,
    /// Total T-states the CPU reported through `elapse`.
    pub elapsed: u64,

    // Mock daisy chain
    pub irq: bool,
    pub nmi: bool,
    pub vector: u8,
    pub acks: u32,
    pub retis: u32,
    pub in_service: bool,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            ports: [0xFF; 0x100],
            io_writes: Vec::new(),
            io_reads: Vec::new(),
            elapsed: 0,
            irq: false,
            nmi: false,
            vector: 0xFF,
            acks: 0,
            retis: 0,
            in_service: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn peek_word(&self, addr: u16) -> u16 {
        let lo = self.memory[addr as usize] as u16;
        let hi = self.memory[addr.wrapping_add(1) as usize] as u16;
        (hi << 8) | lo
    }
}

impl Bus for TestBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.io_reads.push((port, self.elapsed));
        self.ports[(port & 0xFF) as usize]
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.io_writes.push((port, data, self.elapsed));
    }

    fn elapse(&mut self, t_states: u32) {
        self.elapsed += t_states as u64;
    }
}

impl InterruptLine for TestBus {
    fn check_interrupts(&self) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
        }
    }

    /// The requesting device enters service and drops INT.
    fn acknowledge(&mut self) -> u8 {
        self.acks += 1;
        self.irq = false;
        self.in_service = true;
        self.vector
    }

    fn reti(&mut self) -> bool {
        self.retis += 1;
        std::mem::replace(&mut self.in_service, false)
    }
}
