/// A peripheral clocked from the system clock.
pub trait Component {
    /// Advance by `clocks` system clock cycles.
    fn advance(&mut self, clocks: u32);

    /// Return to the power-on state.
    fn reset(&mut self);
}
