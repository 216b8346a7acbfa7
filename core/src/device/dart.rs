use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::{Component, ConfigError, InterruptSource};

/// Z80 DART: dual asynchronous receiver/transmitter
///
/// Two channels, A (index 0) and B (index 1), each with a data port and a
/// control port. Control writes go through a register pointer: a write with
/// the pointer at 0 lands in WR0, whose low three bits select the register
/// the next control write (or read) reaches; the pointer then returns to 0.
///
/// | Register | Function                                              |
/// |----------|-------------------------------------------------------|
/// | WR0      | Register pointer (bits 2-0), command (bits 5-3)       |
/// | WR1      | Interrupt enables, status-affects-vector, Rx int mode |
/// | WR2      | Interrupt vector (channel B only)                     |
/// | WR3      | Rx enable, Rx bits/char                               |
/// | WR4      | Parity, stop bits, clock multiplier                   |
/// | WR5      | Tx enable, Tx bits/char, RTS/DTR                      |
/// | RR0      | Rx available, int pending (A), Tx empty, DCD, CTS     |
/// | RR1      | All sent, parity/overrun/framing errors               |
/// | RR2      | Vector, modified by status if enabled (channel B)     |
///
/// WR0 commands (bits 5-3):
///
/// | Code | Command                          |
/// |------|----------------------------------|
/// | 0    | Null                             |
/// | 2    | Reset ext/status interrupts      |
/// | 3    | Channel reset                    |
/// | 4    | Enable interrupt on next Rx char |
/// | 5    | Reset Tx interrupt pending       |
/// | 6    | Error reset                      |
/// | 7    | Return from interrupt (A only)   |
///
/// Interrupts come from four sources per channel. Their requests and
/// in-service levels are kept in two priority masks shared by both channels,
/// most significant bit = highest priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dart {
    channels: [DartChannel; 2],
    vector: u8,      // WR2 (channel B)
    iflags: DartIrq, // Requesting interrupts
    ius: DartIrq,    // Interrupts under service
    system_hz: u32,  // Clock that character times are measured in
}

bitflags! {
    /// Interrupt priority slots, highest priority first.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DartIrq: u8 {
        const A_SPECIAL = 0x80;
        const A_RX = 0x40;
        const A_TX = 0x20;
        const A_EXT = 0x10;
        const B_SPECIAL = 0x08;
        const B_RX = 0x04;
        const B_TX = 0x02;
        const B_EXT = 0x01;
    }
}

/// Interrupt source within a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DartIntType {
    SpecialRx,
    RxAvailable,
    TxEmpty,
    External,
}

impl DartIrq {
    /// Slot for `kind` on `channel`.
    pub fn slot(channel: usize, kind: DartIntType) -> Self {
        let bit = match kind {
            DartIntType::SpecialRx => 3,
            DartIntType::RxAvailable => 2,
            DartIntType::TxEmpty => 1,
            DartIntType::External => 0,
        };
        let shift = if channel & 1 == 0 { 4 } else { 0 };
        Self::from_bits_retain(1 << (bit + shift))
    }

    /// All four slots belonging to one channel.
    fn channel(channel: usize) -> Self {
        if channel & 1 == 0 { Self::from_bits_retain(0xF0) } else { Self::from_bits_retain(0x0F) }
    }

    /// The single highest-priority slot set, if any.
    pub fn highest(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(Self::from_bits_retain(0x80 >> self.bits().leading_zeros()))
        }
    }

    /// V3-V1 code placed in the vector when status affects vector, indexed by
    /// slot bit number (bit 0 = channel B external).
    fn vector_code(self) -> u8 {
        const CODES: [u8; 8] = [0b001, 0b000, 0b010, 0b011, 0b101, 0b100, 0b110, 0b111];
        CODES[self.bits().trailing_zeros() as usize & 7]
    }
}

const WR1_EXT_INT: u8 = 0x01;
const WR1_TX_INT: u8 = 0x02;
const WR1_STATUS_VECTOR: u8 = 0x04;
const WR1_RX_MODE: u8 = 0x18;
const WR1_WAIT_READY: u8 = 0x80;
const WR3_RX_ENABLE: u8 = 0x01;
const WR4_PARITY: u8 = 0x01;
const WR4_STOP_BITS: u8 = 0x0C;
const WR5_TX_ENABLE: u8 = 0x08;

const RR0_RX_AVAILABLE: u8 = 0x01;
const RR0_INT_PENDING: u8 = 0x02;
const RR0_TX_EMPTY: u8 = 0x04;
const RR0_DCD: u8 = 0x08;
const RR0_CTS: u8 = 0x20;
const RR1_ALL_SENT: u8 = 0x01;
const RR1_PARITY: u8 = 0x10;
const RR1_OVERRUN: u8 = 0x20;
const RR1_ERRORS: u8 = 0x70;

/// Receive interrupt mode, WR1 bits 4-3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RxIntMode {
    Disabled,
    FirstChar,
    AllCharsParityVector,
    AllChars,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
struct DartChannel {
    wr: [u8; 6],          // WR0-WR5 (WR2 kept in Dart::vector)
    pointer: u8,          // Register selected for the next control access
    rr1: u8,
    rx_data: u8,
    rx_full: bool,
    rx_busy: u64,         // Cycles until the receiver can take another char
    rx_first_armed: bool, // First-char mode will interrupt on the next char
    tx_data: u8,
    tx_full: bool,
    tx_busy: u64,         // Cycles until the character is on the line
    cts: bool,
    dcd: bool,
    clock_hz: Option<f64>, // Rx/Tx clock supplied by the board
}

impl DartChannel {
    fn rx_mode(&self) -> RxIntMode {
        match (self.wr[1] & WR1_RX_MODE) >> 3 {
            0 => RxIntMode::Disabled,
            1 => RxIntMode::FirstChar,
            2 => RxIntMode::AllCharsParityVector,
            _ => RxIntMode::AllChars,
        }
    }

    fn clock_multiplier(&self) -> u32 {
        match self.wr[4] >> 6 {
            0 => 1,
            1 => 16,
            2 => 32,
            _ => 64,
        }
    }

    /// Bits per character in half-bit units: start, data, parity, stop.
    fn half_bits(&self, data_bits: u32) -> u32 {
        let parity = (self.wr[4] & WR4_PARITY) as u32;
        let stop = match (self.wr[4] & WR4_STOP_BITS) >> 2 {
            1 => 2,
            2 => 3,
            _ => 4,
        };
        2 * (1 + data_bits + parity) + stop
    }

    fn rx_bits(&self) -> u32 {
        match self.wr[3] >> 6 {
            0 => 5,
            1 => 7,
            2 => 6,
            _ => 8,
        }
    }

    fn tx_bits(&self) -> u32 {
        match (self.wr[5] >> 5) & 0x03 {
            0 => 5,
            1 => 7,
            2 => 6,
            _ => 8,
        }
    }

    fn char_cycles(&self, data_bits: u32, system_hz: u32) -> u64 {
        match self.clock_hz {
            Some(hz) if hz > 0.0 => {
                let bit_rate = hz / self.clock_multiplier() as f64;
                (self.half_bits(data_bits) as f64 / 2.0 * system_hz as f64 / bit_rate) as u64
            }
            _ => 0,
        }
    }

    fn reset(&mut self) {
        let clock_hz = self.clock_hz;
        *self = DartChannel {
            rr1: RR1_ALL_SENT,
            clock_hz,
            ..DartChannel::default()
        };
    }
}

const DEFAULT_SYSTEM_HZ: u32 = 4_000_000;

impl Dart {
    pub fn new() -> Self {
        Self::with_system_clock(DEFAULT_SYSTEM_HZ)
    }

    /// DART whose character times are counted in cycles of `system_hz`.
    pub fn with_system_clock(system_hz: u32) -> Self {
        let mut dart = Self {
            channels: [DartChannel::default(); 2],
            vector: 0,
            iflags: DartIrq::empty(),
            ius: DartIrq::empty(),
            system_hz,
        };
        dart.reset();
        dart
    }

    // --- Port access ---

    /// Control port write: WR0 when the pointer is 0, otherwise the register
    /// it selects.
    pub fn write_control(&mut self, channel: usize, data: u8) -> Result<(), ConfigError> {
        let ch = channel & 1;
        let reg = self.channels[ch].pointer;
        self.channels[ch].pointer = 0;
        self.write_register(ch, reg, data)
    }

    /// Control port read: the register the pointer selects.
    pub fn read_control(&mut self, channel: usize) -> u8 {
        let ch = channel & 1;
        let reg = self.channels[ch].pointer;
        self.channels[ch].pointer = 0;
        self.read_register(ch, reg)
    }

    /// Load the transmit buffer.
    pub fn write_data(&mut self, channel: usize, data: u8) {
        let ch = channel & 1;
        let system_hz = self.system_hz;
        let c = &mut self.channels[ch];
        c.tx_data = data;
        c.tx_full = true;
        c.tx_busy = c.char_cycles(c.tx_bits(), system_hz);
        c.rr1 &= !RR1_ALL_SENT;
        self.clear_interrupt(ch, DartIntType::TxEmpty);
    }

    /// Read the receive buffer.
    pub fn read_data(&mut self, channel: usize) -> u8 {
        let ch = channel & 1;
        let c = &mut self.channels[ch];
        c.rx_full = false;
        let data = c.rx_data;
        self.clear_interrupt(ch, DartIntType::RxAvailable);
        data
    }

    // --- Registers ---

    pub fn write_register(&mut self, channel: usize, reg: u8, data: u8) -> Result<(), ConfigError> {
        let ch = channel & 1;
        match reg & 7 {
            0 => {
                // A channel reset clears the pointer, so the selection in
                // the same byte is applied after the command.
                self.command(ch, (data >> 3) & 7);
                self.channels[ch].wr[0] = data;
                self.channels[ch].pointer = data & 7;
            }
            1 => {
                if (data & WR1_WAIT_READY) != 0 {
                    return Err(ConfigError::DartWaitReady { channel: ch });
                }
                debug!("dart: channel {} WR1 {:02X}", ch, data);
                let c = &mut self.channels[ch];
                c.wr[1] = data;
                if c.rx_mode() == RxIntMode::FirstChar {
                    c.rx_first_armed = true;
                }
                let rx_off = c.rx_mode() == RxIntMode::Disabled;
                if (data & WR1_EXT_INT) == 0 {
                    self.clear_interrupt(ch, DartIntType::External);
                }
                if (data & WR1_TX_INT) == 0 {
                    self.clear_interrupt(ch, DartIntType::TxEmpty);
                }
                if rx_off {
                    self.clear_interrupt(ch, DartIntType::RxAvailable);
                    self.clear_interrupt(ch, DartIntType::SpecialRx);
                }
            }
            2 => {
                if ch == 0 {
                    return Err(ConfigError::DartVectorChannel);
                }
                debug!("dart: vector {:02X}", data);
                self.vector = data;
            }
            4 => {
                if (data & WR4_STOP_BITS) == 0 {
                    return Err(ConfigError::DartSyncMode { channel: ch });
                }
                debug!("dart: channel {} WR4 {:02X}", ch, data);
                self.channels[ch].wr[4] = data;
            }
            reg @ (3 | 5) => {
                debug!("dart: channel {} WR{} {:02X}", ch, reg, data);
                self.channels[ch].wr[reg as usize] = data;
            }
            // WR6/WR7 are sync registers on the SIO; the DART ignores them.
            reg => debug!("dart: channel {} ignored WR{}", ch, reg),
        }
        Ok(())
    }

    pub fn read_register(&self, channel: usize, reg: u8) -> u8 {
        let ch = channel & 1;
        let c = &self.channels[ch];
        match reg & 7 {
            0 => {
                let mut rr0 = 0;
                if c.rx_full { rr0 |= RR0_RX_AVAILABLE; }
                if ch == 0 && !self.iflags.is_empty() { rr0 |= RR0_INT_PENDING; }
                if !c.tx_full { rr0 |= RR0_TX_EMPTY; }
                if c.dcd { rr0 |= RR0_DCD; }
                if c.cts { rr0 |= RR0_CTS; }
                rr0
            }
            1 => c.rr1,
            2 if ch == 1 => self.status_vector(),
            _ => 0xFF,
        }
    }

    fn command(&mut self, ch: usize, cmd: u8) {
        match cmd {
            0 | 1 => {}
            2 => self.clear_interrupt(ch, DartIntType::External),
            3 => {
                debug!("dart: channel {} reset", ch);
                self.channels[ch].reset();
                let mask = DartIrq::channel(ch);
                self.iflags.remove(mask);
                self.ius.remove(mask);
            }
            4 => self.channels[ch].rx_first_armed = true,
            5 => self.clear_interrupt(ch, DartIntType::TxEmpty),
            6 => {
                self.channels[ch].rr1 &= !RR1_ERRORS;
                self.clear_interrupt(ch, DartIntType::SpecialRx);
            }
            7 => {
                if ch == 0 {
                    self.reti();
                }
            }
            _ => unreachable!(),
        }
    }

    // --- Serial pump ---

    /// The receiver can take a character: enabled, buffer empty, and the
    /// previous character's time has passed.
    pub fn rx_ready(&self, channel: usize) -> bool {
        let c = &self.channels[channel & 1];
        (c.wr[3] & WR3_RX_ENABLE) != 0 && !c.rx_full && c.rx_busy == 0
    }

    /// A character arrives from the line. A character landing on a full
    /// buffer overwrites it and flags an overrun.
    pub fn rx_byte(&mut self, channel: usize, data: u8) {
        self.receive(channel & 1, data, false);
    }

    /// A character arrives with a parity error.
    pub fn rx_byte_with_parity_error(&mut self, channel: usize, data: u8) {
        self.receive(channel & 1, data, true);
    }

    fn receive(&mut self, ch: usize, data: u8, parity_error: bool) {
        let system_hz = self.system_hz;
        let c = &mut self.channels[ch];
        if (c.wr[3] & WR3_RX_ENABLE) == 0 {
            return;
        }
        let overrun = c.rx_full;
        c.rx_data = data;
        c.rx_full = true;
        c.rx_busy = c.char_cycles(c.rx_bits(), system_hz);
        if overrun { c.rr1 |= RR1_OVERRUN; }
        if parity_error { c.rr1 |= RR1_PARITY; }

        let mode = c.rx_mode();
        let special = overrun || (parity_error && mode == RxIntMode::AllCharsParityVector);
        let available = match mode {
            RxIntMode::Disabled => false,
            RxIntMode::FirstChar => std::mem::take(&mut c.rx_first_armed),
            RxIntMode::AllCharsParityVector | RxIntMode::AllChars => true,
        };
        if mode != RxIntMode::Disabled && special {
            self.set_interrupt(ch, DartIntType::SpecialRx);
        } else if available {
            self.set_interrupt(ch, DartIntType::RxAvailable);
        }
    }

    /// Hand a finished character to the line. Empties the transmit buffer
    /// and, if enabled, requests the Tx-empty interrupt.
    pub fn tx_ready(&mut self, channel: usize) -> Option<u8> {
        let ch = channel & 1;
        let c = &mut self.channels[ch];
        if !c.tx_full || c.tx_busy > 0 || (c.wr[5] & WR5_TX_ENABLE) == 0 {
            return None;
        }
        c.tx_full = false;
        c.rr1 |= RR1_ALL_SENT;
        let data = c.tx_data;
        if (c.wr[1] & WR1_TX_INT) != 0 {
            self.set_interrupt(ch, DartIntType::TxEmpty);
        }
        Some(data)
    }

    pub fn set_cts(&mut self, channel: usize, level: bool) {
        let ch = channel & 1;
        if self.channels[ch].cts != level {
            self.channels[ch].cts = level;
            self.status_change(ch);
        }
    }

    pub fn set_dcd(&mut self, channel: usize, level: bool) {
        let ch = channel & 1;
        if self.channels[ch].dcd != level {
            self.channels[ch].dcd = level;
            self.status_change(ch);
        }
    }

    fn status_change(&mut self, ch: usize) {
        if (self.channels[ch].wr[1] & WR1_EXT_INT) != 0 {
            self.set_interrupt(ch, DartIntType::External);
        }
    }

    // --- Timing ---

    /// Rx/Tx clock for a channel in Hz, normally a CTC zero-count output.
    pub fn set_clock(&mut self, channel: usize, hz: Option<f64>) {
        self.channels[channel & 1].clock_hz = hz;
    }

    /// Bit rate the guest has asked for on `channel`.
    pub fn requested_baud(&self, channel: usize) -> Option<u32> {
        let c = &self.channels[channel & 1];
        c.clock_hz
            .filter(|&hz| hz > 0.0)
            .map(|hz| (hz / c.clock_multiplier() as f64).round() as u32)
    }

    /// Emulated cycles to transmit one character with the current framing.
    /// Zero while the channel has no clock.
    pub fn char_time(&self, channel: usize) -> u64 {
        let c = &self.channels[channel & 1];
        c.char_cycles(c.tx_bits(), self.system_hz)
    }

    // --- Interrupts ---

    pub fn set_interrupt(&mut self, channel: usize, kind: DartIntType) {
        self.iflags.insert(DartIrq::slot(channel, kind));
    }

    pub fn clear_interrupt(&mut self, channel: usize, kind: DartIntType) {
        self.iflags.remove(DartIrq::slot(channel, kind));
    }

    pub fn iflags(&self) -> DartIrq {
        self.iflags
    }

    pub fn ius(&self) -> DartIrq {
        self.ius
    }

    /// Highest request not already in service, if it outranks everything
    /// in service.
    fn next_request(&self) -> Option<DartIrq> {
        let candidate = self.iflags.difference(self.ius).highest()?;
        match self.ius.highest() {
            Some(top) if top.bits() > candidate.bits() => None,
            _ => Some(candidate),
        }
    }

    fn status_affects_vector(&self) -> bool {
        (self.channels[1].wr[1] & WR1_STATUS_VECTOR) != 0
    }

    fn vector_for(&self, slot: Option<DartIrq>) -> u8 {
        if !self.status_affects_vector() {
            return self.vector;
        }
        // With nothing pending the part reports channel B special receive.
        let code = slot.map_or(0b011, DartIrq::vector_code);
        (self.vector & 0xF1) | (code << 1)
    }

    fn status_vector(&self) -> u8 {
        self.vector_for(self.iflags.difference(self.ius).highest())
    }

    pub fn interrupt_pending(&self) -> bool {
        self.next_request().is_some()
    }

    /// Put the highest-priority request in service and return its vector.
    pub fn acknowledge(&mut self) -> Option<u8> {
        let slot = self.next_request()?;
        self.ius.insert(slot);
        Some(self.vector_for(Some(slot)))
    }

    /// End service of the highest-priority level in service.
    pub fn reti(&mut self) -> bool {
        match self.ius.highest() {
            Some(top) => {
                self.ius.remove(top);
                true
            }
            None => false,
        }
    }
}

impl Default for Dart {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Dart {
    fn advance(&mut self, clocks: u32) {
        for c in self.channels.iter_mut() {
            c.rx_busy = c.rx_busy.saturating_sub(clocks as u64);
            c.tx_busy = c.tx_busy.saturating_sub(clocks as u64);
        }
    }

    fn reset(&mut self) {
        for c in self.channels.iter_mut() {
            c.reset();
        }
        self.vector = 0;
        self.iflags = DartIrq::empty();
        self.ius = DartIrq::empty();
    }
}

impl InterruptSource for Dart {
    fn interrupt_pending(&self) -> bool {
        Dart::interrupt_pending(self)
    }

    fn in_service(&self) -> bool {
        !self.ius.is_empty()
    }

    fn acknowledge(&mut self) -> Option<u8> {
        Dart::acknowledge(self)
    }

    fn reti(&mut self) -> bool {
        Dart::reti(self)
    }
}
