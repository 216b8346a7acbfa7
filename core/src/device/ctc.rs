use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{Component, ConfigError, InterruptSource};

/// Z80 CTC: four-channel counter/timer circuit
///
/// Each channel has one port. A byte written to it is, in order of precedence:
/// the time constant (if the previous control word announced one), a control
/// word (bit 0 = 1), or the interrupt vector (bit 0 = 0, channel 0 only).
///
/// Control word:
///
/// | Bit | Meaning                                         |
/// |-----|-------------------------------------------------|
/// | 7   | Interrupt enable                                |
/// | 6   | Mode: 0 = timer, 1 = counter                    |
/// | 5   | Prescaler (timer mode): 0 = 16, 1 = 256         |
/// | 4   | CLK/TRG active edge: 0 = falling, 1 = rising    |
/// | 3   | Timer trigger: 0 = automatic, 1 = CLK/TRG edge  |
/// | 2   | Time constant follows                           |
/// | 1   | Software reset                                  |
/// | 0   | 1 = control word                                |
///
/// In counter mode every active CLK/TRG edge decrements the down-counter. In
/// timer mode the system clock runs through the prescaler and each prescaler
/// underflow decrements the down-counter. On reaching zero the counter reloads
/// from the time constant (0 means 256) and, if enabled, requests an
/// interrupt.
///
/// Interrupt priority is fixed: channel 0 highest, channel 3 lowest. A
/// channel's request is only raised to the CPU while no higher-priority
/// channel is raised or in service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ctc {
    channels: [CtcChannel; 4],
    vector: u8,        // Vector base, bits 7-3
    div13: [bool; 4],  // Channel CLK/TRG wired to system clock / 13
    div13_residue: u32, // System clocks not yet worth a divided edge
}

const CTRL_CONTROL: u8 = 0x01;
const CTRL_RESET: u8 = 0x02;
const CTRL_CONSTANT: u8 = 0x04;
const CTRL_TRIGGER: u8 = 0x08;
const CTRL_RISING: u8 = 0x10;
const CTRL_PRESCALE_256: u8 = 0x20;
const CTRL_COUNTER: u8 = 0x40;
const CTRL_INT_ENABLE: u8 = 0x80;

/// System clocks per edge on a channel fed from the divided clock.
pub const DIV13: u32 = 13;

/// Interrupt state of one channel.
///
/// Only ever moves None → Pending → Raised → InService → None, apart from
/// the forced return to None on reset or vector write, and a request not yet
/// acknowledged being withdrawn when the channel's interrupts are disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CtcIntState {
    #[default]
    None,
    Pending,
    Raised,
    InService,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IntEvent {
    Request,
    Raise,
    Acknowledge,
    Reti,
    Withdraw,
    Clear,
}

impl CtcIntState {
    fn on(self, event: IntEvent) -> Self {
        match (self, event) {
            (CtcIntState::None, IntEvent::Request) => CtcIntState::Pending,
            (CtcIntState::Pending, IntEvent::Raise) => CtcIntState::Raised,
            (CtcIntState::Raised, IntEvent::Acknowledge) => CtcIntState::InService,
            (CtcIntState::InService, IntEvent::Reti) => CtcIntState::None,
            (CtcIntState::Pending | CtcIntState::Raised, IntEvent::Withdraw) => CtcIntState::None,
            (_, IntEvent::Clear) => CtcIntState::None,
            (state, _) => state,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
struct CtcChannel {
    control: u8,          // Last control word
    prescaler: u16,       // System clocks left before the next timer decrement
    constant: u8,         // Time constant, 0 = 256
    counter: u8,          // Down-counter, 0 = 256
    running: bool,        // Counting (timer started / counter loaded)
    constant_next: bool,  // Next write is a time constant
    await_trigger: bool,  // Timer loaded, waiting for a CLK/TRG edge to start
    trg_level: bool,      // Last CLK/TRG level (edge detection)
    zero_counts: u64,     // ZC/TO pulses since power-on
    int_state: CtcIntState,
}

fn count_value(v: u8) -> u32 {
    if v == 0 { 256 } else { v as u32 }
}

impl CtcChannel {
    fn prescale_factor(&self) -> u16 {
        if (self.control & CTRL_PRESCALE_256) != 0 { 256 } else { 16 }
    }

    fn is_counter(&self) -> bool {
        (self.control & CTRL_COUNTER) != 0
    }

    /// Decrement the down-counter `ticks` times. Returns true if it passed
    /// through zero at least once.
    fn count(&mut self, mut ticks: u32) -> bool {
        let mut zero = false;
        while ticks > 0 {
            let current = count_value(self.counter);
            if ticks < current {
                self.counter = (current - ticks) as u8;
                break;
            }
            ticks -= current;
            self.counter = self.constant;
            self.zero_counts += 1;
            zero = true;
        }
        zero
    }

    /// Run the prescaler for `clocks` system clocks, returning the number of
    /// down-counter decrements it produces.
    fn prescale(&mut self, clocks: u32) -> u32 {
        let factor = self.prescale_factor() as u32;
        let left = self.prescaler as u32;
        if clocks < left {
            self.prescaler = (left - clocks) as u16;
            return 0;
        }
        let rest = clocks - left;
        self.prescaler = (factor - rest % factor) as u16;
        1 + rest / factor
    }
}

impl Ctc {
    pub fn new() -> Self {
        let mut ctc = Self {
            channels: [CtcChannel::default(); 4],
            vector: 0,
            div13: [false; 4],
            div13_residue: 0,
        };
        ctc.reset();
        ctc
    }

    /// CTC whose listed channels have CLK/TRG driven by the system clock
    /// divided by 13 (MTX wiring: channels 1 and 2).
    pub fn with_div13(channels: &[usize]) -> Self {
        let mut ctc = Self::new();
        for &ch in channels {
            ctc.div13[ch & 3] = true;
        }
        ctc
    }

    /// Port write to `channel`.
    pub fn write(&mut self, channel: usize, data: u8) -> Result<(), ConfigError> {
        let ch = channel & 3;
        if self.channels[ch].constant_next {
            self.write_constant(ch, data);
            Ok(())
        } else if (data & CTRL_CONTROL) != 0 {
            self.write_control(ch, data);
            Ok(())
        } else {
            self.write_vector(ch, data)
        }
    }

    /// Port read from `channel`: the current down-counter value.
    pub fn read(&self, channel: usize) -> u8 {
        self.channels[channel & 3].counter
    }

    pub fn write_control(&mut self, channel: usize, data: u8) {
        let ch = channel & 3;
        debug!("ctc: channel {} control {:02X}", ch, data);
        let c = &mut self.channels[ch];
        c.control = data;
        c.constant_next = (data & CTRL_CONSTANT) != 0;
        if (data & CTRL_RESET) != 0 {
            c.running = false;
            c.await_trigger = false;
            c.prescaler = c.prescale_factor();
            // A reset in the middle of an interrupt also drops the interrupt;
            // guest software relies on this to recover a stuck channel.
            c.int_state = c.int_state.on(IntEvent::Clear);
            self.promote();
        } else if (data & CTRL_INT_ENABLE) == 0 {
            // An unacknowledged request goes away with the enable bit; a
            // channel already in service still waits for its RETI.
            c.int_state = c.int_state.on(IntEvent::Withdraw);
            self.promote();
        }
    }

    pub fn write_constant(&mut self, channel: usize, data: u8) {
        let ch = channel & 3;
        let c = &mut self.channels[ch];
        c.constant = data;
        c.constant_next = false;
        if c.is_counter() {
            // The data sheet says a new constant written while counting only
            // takes effect at the next zero count. Real parts reload the
            // counter straight away, and MTX software depends on that.
            c.counter = data;
            c.running = true;
            c.await_trigger = false;
        } else if !c.running {
            c.counter = data;
            c.prescaler = c.prescale_factor();
            if (c.control & CTRL_TRIGGER) != 0 {
                c.await_trigger = true;
            } else {
                c.running = true;
            }
        }
        debug!("ctc: channel {} constant {}", ch, count_value(data));
    }

    /// Interrupt vector (bits 7-3 kept). Only channel 0 latches a vector;
    /// writing it also clears channel 0's interrupt state.
    pub fn write_vector(&mut self, channel: usize, data: u8) -> Result<(), ConfigError> {
        if channel & 3 != 0 {
            return Err(ConfigError::CtcVectorChannel { channel: channel & 3 });
        }
        self.vector = data & 0xF8;
        let c = &mut self.channels[0];
        c.int_state = c.int_state.on(IntEvent::Clear);
        self.promote();
        Ok(())
    }

    /// One active edge on the channel's CLK/TRG input.
    pub fn trigger(&mut self, channel: usize) {
        let ch = channel & 3;
        let c = &mut self.channels[ch];
        if c.is_counter() {
            if c.running && c.count(1) {
                self.zero_count(ch);
            }
        } else if c.await_trigger {
            c.await_trigger = false;
            c.running = true;
        }
    }

    /// Drive the CLK/TRG input to `level`; an edge matching the programmed
    /// polarity counts as a trigger.
    pub fn set_trigger_level(&mut self, channel: usize, level: bool) {
        let ch = channel & 3;
        let c = &mut self.channels[ch];
        let rising = (c.control & CTRL_RISING) != 0;
        let edge = level != c.trg_level && level == rising;
        c.trg_level = level;
        if edge {
            self.trigger(ch);
        }
    }

    /// Zero-count output rate of a channel in Hz, if it is running from a
    /// known clock.
    pub fn output_frequency(&self, channel: usize, system_hz: u32) -> Option<f64> {
        let ch = channel & 3;
        let c = &self.channels[ch];
        if !c.running {
            return None;
        }
        let constant = count_value(c.constant) as f64;
        if c.is_counter() {
            self.div13[ch].then(|| system_hz as f64 / DIV13 as f64 / constant)
        } else {
            Some(system_hz as f64 / c.prescale_factor() as f64 / constant)
        }
    }

    pub fn zero_counts(&self, channel: usize) -> u64 {
        self.channels[channel & 3].zero_counts
    }

    pub fn int_state(&self, channel: usize) -> CtcIntState {
        self.channels[channel & 3].int_state
    }

    pub fn vector(&self) -> u8 {
        self.vector
    }

    /// The highest channel that is raised or in service, if it is raised.
    /// A channel in service blocks every channel below it.
    fn requesting_channel(&self) -> Option<usize> {
        self.channels
            .iter()
            .position(|c| matches!(c.int_state, CtcIntState::Raised | CtcIntState::InService))
            .filter(|&ch| self.channels[ch].int_state == CtcIntState::Raised)
    }

    /// A channel is raised to the CPU and not blocked by a higher one in
    /// service.
    pub fn interrupt_pending(&self) -> bool {
        self.requesting_channel().is_some()
    }

    /// Acknowledge the highest-priority raised channel. Returns the vector
    /// and the channel index.
    pub fn acknowledge(&mut self) -> Option<(u8, usize)> {
        let ch = self.requesting_channel()?;
        let c = &mut self.channels[ch];
        c.int_state = c.int_state.on(IntEvent::Acknowledge);
        Some((self.vector | ((ch as u8) << 1), ch))
    }

    /// End of service for the highest-priority channel in service.
    pub fn reti(&mut self) -> bool {
        let Some(ch) = self
            .channels
            .iter()
            .position(|c| c.int_state == CtcIntState::InService)
        else {
            return false;
        };
        let c = &mut self.channels[ch];
        c.int_state = c.int_state.on(IntEvent::Reti);
        self.promote();
        true
    }

    fn zero_count(&mut self, ch: usize) {
        let c = &mut self.channels[ch];
        if (c.control & CTRL_INT_ENABLE) != 0 && c.int_state == CtcIntState::None {
            c.int_state = c.int_state.on(IntEvent::Request);
            self.promote();
        }
    }

    /// Raise pending channels that no higher-priority channel is masking.
    fn promote(&mut self) {
        let mut masked = false;
        for c in self.channels.iter_mut() {
            match c.int_state {
                CtcIntState::Pending if !masked => {
                    c.int_state = c.int_state.on(IntEvent::Raise);
                    masked = true;
                }
                CtcIntState::Raised | CtcIntState::InService => masked = true,
                _ => {}
            }
        }
    }
}

impl Default for Ctc {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Ctc {
    /// Advance timers by `clocks` system clocks, and counters wired to the
    /// divided clock by the edges those clocks produce.
    fn advance(&mut self, clocks: u32) {
        let total = self.div13_residue + clocks;
        let edges = total / DIV13;
        self.div13_residue = total % DIV13;

        for ch in 0..4 {
            let c = &mut self.channels[ch];
            if !c.running {
                continue;
            }
            let ticks = if c.is_counter() {
                if self.div13[ch] { edges } else { 0 }
            } else {
                c.prescale(clocks)
            };
            if ticks > 0 && c.count(ticks) {
                self.zero_count(ch);
            }
        }
    }

    fn reset(&mut self) {
        for c in self.channels.iter_mut() {
            *c = CtcChannel {
                control: CTRL_RESET | CTRL_CONTROL,
                prescaler: 16,
                ..CtcChannel::default()
            };
        }
        self.div13_residue = 0;
    }
}

impl InterruptSource for Ctc {
    fn interrupt_pending(&self) -> bool {
        Ctc::interrupt_pending(self)
    }

    fn in_service(&self) -> bool {
        self.channels.iter().any(|c| c.int_state == CtcIntState::InService)
    }

    fn acknowledge(&mut self) -> Option<u8> {
        Ctc::acknowledge(self).map(|(vector, _)| vector)
    }

    fn reti(&mut self) -> bool {
        Ctc::reti(self)
    }
}
