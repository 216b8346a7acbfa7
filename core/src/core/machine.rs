use super::error::MachineError;

/// Machine-agnostic interface for emulated systems.
///
/// Each board implements this trait so the frontend can drive it without
/// knowing about its memory map, port decoding or peripheral wiring. The
/// frontend is headless: it runs frames and moves serial bytes.
pub trait Machine {
    /// Run one frame of emulation (advance the clock by one frame's worth of
    /// T-states). A peripheral configuration fault ends the frame early.
    fn run_frame(&mut self) -> Result<(), MachineError>;

    /// T-states in one frame.
    fn frame_t_states(&self) -> u32;

    /// Offer a byte from the host to a serial channel. Returns false if the
    /// channel's receive buffer could not take it yet.
    fn serial_rx(&mut self, channel: usize, byte: u8) -> bool;

    /// Take the next byte the guest has finished transmitting, if any.
    fn serial_tx(&mut self, channel: usize) -> Option<u8>;

    /// Serialize the complete machine state (ROM images excluded).
    fn save_state(&self) -> Result<Vec<u8>, MachineError>;

    /// Restore a state produced by [`Machine::save_state`].
    fn load_state(&mut self, data: &[u8]) -> Result<(), MachineError>;

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}
