use super::bus::InterruptState;

/// Vector returned when an acknowledge cycle finds no requesting device
/// (the data bus floats high).
pub const FLOATING_VECTOR: u8 = 0xFF;

/// A device sitting on the Z80 interrupt daisy chain.
///
/// Each device owns its own request and in-service state; the chain only
/// asks these questions in priority order.
pub trait InterruptSource {
    /// The device is asserting INT and would answer an acknowledge cycle.
    fn interrupt_pending(&self) -> bool;

    /// Some interrupt of this device is under service (IEO held low), which
    /// blocks every device further down the chain.
    fn in_service(&self) -> bool;

    /// Acknowledge cycle: the highest-priority request enters service.
    /// Returns the vector, or `None` if nothing was requesting.
    fn acknowledge(&mut self) -> Option<u8>;

    /// RETI seen on the bus. Returns true if an in-service level was cleared.
    fn reti(&mut self) -> bool;
}

/// Resolves chain keys to devices. Implemented by whatever owns the devices.
pub trait DaisyDevices<K> {
    fn device(&self, key: K) -> &dyn InterruptSource;
    fn device_mut(&mut self, key: K) -> &mut dyn InterruptSource;
}

/// Interrupt arbiter: a fixed priority order over device keys.
///
/// The order is chosen when the board is built (CTC before DART on the MTX,
/// but other wirings exist). The chain stores nothing else; all interrupt
/// state lives in the devices.
#[derive(Clone, Debug, PartialEq)]
pub struct DaisyChain<K> {
    order: Vec<K>,
}

impl<K: Copy> DaisyChain<K> {
    /// `order[0]` has the highest priority.
    pub fn new(order: Vec<K>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[K] {
        &self.order
    }

    /// True if the first device that is either requesting or in service is
    /// requesting. An in-service device masks everything below it.
    pub fn interrupt_pending<D: DaisyDevices<K> + ?Sized>(&self, devices: &D) -> bool {
        for &key in &self.order {
            let dev = devices.device(key);
            if dev.interrupt_pending() {
                return true;
            }
            if dev.in_service() {
                return false;
            }
        }
        false
    }

    /// Run an acknowledge cycle down the chain and return the vector.
    pub fn acknowledge<D: DaisyDevices<K> + ?Sized>(&self, devices: &mut D) -> u8 {
        for &key in &self.order {
            let dev = devices.device_mut(key);
            if dev.interrupt_pending() {
                return dev.acknowledge().unwrap_or(FLOATING_VECTOR);
            }
            if dev.in_service() {
                break;
            }
        }
        FLOATING_VECTOR
    }

    /// Offer RETI to each device in priority order; the first one that
    /// clears an in-service level consumes it.
    pub fn reti<D: DaisyDevices<K> + ?Sized>(&self, devices: &mut D) -> bool {
        self.order
            .iter()
            .any(|&key| devices.device_mut(key).reti())
    }

    /// Line state for the CPU, combining the chain with the board's NMI level.
    pub fn line_state<D: DaisyDevices<K> + ?Sized>(&self, devices: &D, nmi: bool) -> InterruptState {
        InterruptState {
            nmi,
            irq: self.interrupt_pending(devices),
        }
    }
}
