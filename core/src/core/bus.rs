/// Memory and I/O access issued by the CPU.
///
/// The CPU owns no memory: every opcode fetch, operand read, stack access and
/// port access goes through this trait. Boards implement it on top of their
/// memory map and port decoder.
pub trait Bus {
    type Address: Copy + Into<u64>;
    type Data;

    fn read(&mut self, addr: Self::Address) -> Self::Data;
    fn write(&mut self, addr: Self::Address, data: Self::Data);

    /// Read from the I/O port space. The full 16-bit port address is passed
    /// through; boards that decode only the low byte mask it themselves.
    fn io_read(&mut self, port: Self::Address) -> Self::Data;

    /// Write to the I/O port space.
    fn io_write(&mut self, port: Self::Address, data: Self::Data);

    /// Called by the CPU each time it charges T-states, before its next bus
    /// access. Boards advance their peripherals here so device state always
    /// matches the CPU's position in emulated time.
    fn elapse(&mut self, _t_states: u32) {}
}

/// Interrupt lines seen by the CPU at an instruction boundary.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct InterruptState {
    pub nmi: bool, // NMI line level (the CPU detects the rising edge)
    pub irq: bool, // INT line: some device in the daisy chain wants service
}

/// The CPU's view of the interrupt arbiter.
///
/// Kept separate from [`Bus`] so the CPU can be driven against a mock daisy
/// chain in tests.
pub trait InterruptLine {
    /// Current state of the NMI and INT lines.
    fn check_interrupts(&self) -> InterruptState;

    /// Interrupt acknowledge cycle: the highest-priority requesting device
    /// enters service and supplies its vector byte.
    fn acknowledge(&mut self) -> u8;

    /// RETI was executed. Returns true if a device left service.
    fn reti(&mut self) -> bool;
}
