use mtx_core::core::{Bus, InterruptLine, InterruptState};
use mtx_core::core::daisy::FLOATING_VECTOR;
use mtx_core::cpu::{CpuStateTrait, Z80, Z80State};

/// Bare Z80 board: 64KB of RAM, a latch per port, nothing on the interrupt
/// lines.
pub struct SimpleZ80System {
    pub cpu: Z80,
    bus: FlatBus,
}

struct FlatBus {
    ram: Box<[u8; 0x10000]>,
    ports_in: [u8; 0x100],
    ports_out: [u8; 0x100],
    clock: u64,
}

impl SimpleZ80System {
    pub fn new() -> Self {
        Self {
            cpu: Z80::new(),
            bus: FlatBus {
                ram: Box::new([0; 0x10000]),
                ports_in: [0xFF; 0x100],
                ports_out: [0; 0x100],
                clock: 0,
            },
        }
    }

    /// Execute one instruction and return its T-states.
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    /// Run for `cycles` T-states; returns the overrun (zero or negative).
    pub fn run(&mut self, cycles: i32) -> i32 {
        self.cpu.run(&mut self.bus, cycles)
    }

    pub fn load_program(&mut self, offset: usize, data: &[u8]) {
        if offset + data.len() <= self.bus.ram.len() {
            self.bus.ram[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    pub fn read_memory(&self, addr: u16) -> u8 {
        self.bus.ram[addr as usize]
    }

    /// Value the next `IN` from `port` (low byte) returns.
    pub fn set_port_input(&mut self, port: u8, value: u8) {
        self.bus.ports_in[port as usize] = value;
    }

    /// Last value written to `port` (low byte).
    pub fn port_output(&self, port: u8) -> u8 {
        self.bus.ports_out[port as usize]
    }

    /// T-states elapsed since power-on.
    pub fn clock(&self) -> u64 {
        self.bus.clock
    }

    pub fn get_cpu_state(&self) -> Z80State {
        self.cpu.snapshot()
    }
}

impl Default for SimpleZ80System {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.ram[addr as usize] = data;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.ports_in[(port & 0xFF) as usize]
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.ports_out[(port & 0xFF) as usize] = data;
    }

    fn elapse(&mut self, t_states: u32) {
        self.clock += t_states as u64;
    }
}

impl InterruptLine for FlatBus {
    fn check_interrupts(&self) -> InterruptState {
        InterruptState::default()
    }

    fn acknowledge(&mut self) -> u8 {
        FLOATING_VECTOR
    }

    fn reti(&mut self) -> bool {
        false
    }
}
