use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use mtx_core::core::{
    Bus, Component, ConfigError, DaisyChain, DaisyDevices, InterruptLine, InterruptSource,
    InterruptState, Machine, MachineError,
};
use mtx_core::cpu::{Cpu, CpuStateTrait, Z80, Z80State};
use mtx_core::device::{Ctc, Dart};

use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

// ---------------------------------------------------------------------------
// ROM definitions
// ---------------------------------------------------------------------------

/// Operating system ROM: 8KB at 0x0000-0x1FFF.
pub static MTX_OS_ROM: RomRegion = RomRegion {
    size: 0x2000,
    fill: 0xFF,
    entries: &[RomEntry {
        name: "os.rom",
        size: 0x2000,
        offset: 0x0000,
        crc32: None,
        required: true,
    }],
};

/// Paged ROM: eight 8KB slots switched into 0x2000-0x3FFF. BASIC sits in
/// slot 0 and the assembler in slot 1; the remaining slots are empty sockets.
pub static MTX_PAGED_ROMS: RomRegion = RomRegion {
    size: ROM_SLOTS * ROM_SLOT_SIZE,
    fill: 0xFF,
    entries: &[
        RomEntry {
            name: "basic.rom",
            size: 0x2000,
            offset: 0x0000,
            crc32: None,
            required: true,
        },
        RomEntry {
            name: "assem.rom",
            size: 0x2000,
            offset: 0x2000,
            crc32: None,
            required: false,
        },
    ],
};

// ---------------------------------------------------------------------------
// Timing and memory map
// ---------------------------------------------------------------------------
// System clock:  4 MHz
// Frame:         50 Hz, 80 000 T-states; the video interrupt pulses CTC
//                channel 0 once per frame
// CTC ch 1/2:    counters on the 4 MHz / 13 clock, outputs clock the DART

pub const SYSTEM_HZ: u32 = 4_000_000;
pub const FRAME_T_STATES: u32 = SYSTEM_HZ / 50;

const ROM_SLOTS: usize = 8;
const ROM_SLOT_SIZE: usize = 0x2000;
const RAM_PAGE_SIZE: usize = 0x8000;
const COMMON_RAM_SIZE: usize = 0x4000;
const MAX_RAM_PAGES: usize = 16;

const CTC_FRAME_CHANNEL: usize = 0;
const CTC_DART_A_CHANNEL: usize = 1;
const CTC_DART_B_CHANNEL: usize = 2;

// ---------------------------------------------------------------------------
// Board configuration
// ---------------------------------------------------------------------------

/// Interrupt sources on the daisy chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MtxDevice {
    Ctc,
    Dart,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Daisy chain wiring, highest priority first.
    pub daisy_order: Vec<MtxDevice>,
    /// 32KB pages fitted behind 0x4000-0xBFFF (1-16).
    pub ram_pages: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            daisy_order: vec![MtxDevice::Ctc, MtxDevice::Dart],
            ram_pages: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

struct MtxDevices {
    ctc: Ctc,
    dart: Dart,
}

impl DaisyDevices<MtxDevice> for MtxDevices {
    fn device(&self, key: MtxDevice) -> &dyn InterruptSource {
        match key {
            MtxDevice::Ctc => &self.ctc,
            MtxDevice::Dart => &self.dart,
        }
    }

    fn device_mut(&mut self, key: MtxDevice) -> &mut dyn InterruptSource {
        match key {
            MtxDevice::Ctc => &mut self.ctc,
            MtxDevice::Dart => &mut self.dart,
        }
    }
}

/// Everything the CPU sees through its bus: memory, ports and the daisy
/// chain.
struct MtxBoard {
    os_rom: Vec<u8>,    // 0x0000-0x1FFF
    paged_rom: Vec<u8>, // 8 slots for 0x2000-0x3FFF
    ram: Vec<u8>,       // common 16KB, then the 32KB pages
    ram_pages: usize,
    iobyte: u8, // bits 6-4 ROM slot, bits 3-0 RAM page

    devices: MtxDevices,
    chain: DaisyChain<MtxDevice>,

    /// First unsupported peripheral mode the guest selected.
    fault: Option<ConfigError>,
}

impl MtxBoard {
    fn new(config: &BoardConfig) -> Self {
        let ram_pages = config.ram_pages.clamp(1, MAX_RAM_PAGES);
        if ram_pages != config.ram_pages {
            warn!("{} RAM pages requested, fitting {ram_pages}", config.ram_pages);
        }
        let mut board = Self {
            os_rom: vec![0xFF; ROM_SLOT_SIZE],
            paged_rom: vec![0xFF; ROM_SLOTS * ROM_SLOT_SIZE],
            ram: vec![0; COMMON_RAM_SIZE + ram_pages * RAM_PAGE_SIZE],
            ram_pages,
            iobyte: 0,
            devices: MtxDevices {
                ctc: Ctc::with_div13(&[CTC_DART_A_CHANNEL, CTC_DART_B_CHANNEL]),
                dart: Dart::with_system_clock(SYSTEM_HZ),
            },
            chain: DaisyChain::new(config.daisy_order.clone()),
            fault: None,
        };
        board.sync_dart_clocks();
        board
    }

    fn rom_slot(&self) -> usize {
        ((self.iobyte >> 4) & 0x07) as usize
    }

    /// Offset of the selected RAM page, or None if that page is not fitted.
    fn ram_page_base(&self) -> Option<usize> {
        let page = (self.iobyte & 0x0F) as usize;
        (page < self.ram_pages).then(|| COMMON_RAM_SIZE + page * RAM_PAGE_SIZE)
    }

    fn peek(&self, addr: u16) -> u8 {
        let a = addr as usize;
        match addr {
            0x0000..=0x1FFF => self.os_rom[a],
            0x2000..=0x3FFF => self.paged_rom[self.rom_slot() * ROM_SLOT_SIZE + (a - 0x2000)],
            0x4000..=0xBFFF => match self.ram_page_base() {
                Some(base) => self.ram[base + (a - 0x4000)],
                None => 0xFF,
            },
            0xC000..=0xFFFF => self.ram[a - 0xC000],
        }
    }

    fn poke(&mut self, addr: u16, data: u8) {
        let a = addr as usize;
        match addr {
            0x0000..=0x3FFF => {} // ROM
            0x4000..=0xBFFF => {
                if let Some(base) = self.ram_page_base() {
                    self.ram[base + (a - 0x4000)] = data;
                }
            }
            0xC000..=0xFFFF => self.ram[a - 0xC000] = data,
        }
    }

    /// Keep the first configuration fault; later ones are logged only.
    fn latch(&mut self, result: Result<(), ConfigError>) {
        if let Err(err) = result {
            warn!("Peripheral fault: {err}");
            if self.fault.is_none() {
                self.fault = Some(err);
            }
        }
    }

    /// The DART's baud clocks come from the CTC zero-count outputs.
    fn sync_dart_clocks(&mut self) {
        let ctc = &self.devices.ctc;
        let a = ctc.output_frequency(CTC_DART_A_CHANNEL, SYSTEM_HZ);
        let b = ctc.output_frequency(CTC_DART_B_CHANNEL, SYSTEM_HZ);
        self.devices.dart.set_clock(0, a);
        self.devices.dart.set_clock(1, b);
    }

    fn reset(&mut self) {
        self.iobyte = 0;
        self.devices.ctc.reset();
        self.devices.dart.reset();
        self.fault = None;
        self.sync_dart_clocks();
    }
}

impl Bus for MtxBoard {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.poke(addr, data);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        match port as u8 {
            p @ 0x08..=0x0B => self.devices.ctc.read((p - 0x08) as usize),
            0x0C => self.devices.dart.read_data(0),
            0x0D => self.devices.dart.read_data(1),
            0x0E => self.devices.dart.read_control(0),
            0x0F => self.devices.dart.read_control(1),
            p => {
                trace!("Unmapped port read {p:02X}");
                0xFF
            }
        }
    }

    fn io_write(&mut self, port: u16, data: u8) {
        match port as u8 {
            0x00 => {
                debug!("IOBYTE {data:02X}");
                self.iobyte = data;
            }
            p @ 0x08..=0x0B => {
                let result = self.devices.ctc.write((p - 0x08) as usize, data);
                self.latch(result);
                self.sync_dart_clocks();
            }
            0x0C => self.devices.dart.write_data(0, data),
            0x0D => self.devices.dart.write_data(1, data),
            p @ (0x0E | 0x0F) => {
                let result = self.devices.dart.write_control((p - 0x0E) as usize, data);
                self.latch(result);
            }
            p => trace!("Unmapped port write {p:02X} <- {data:02X}"),
        }
    }

    fn elapse(&mut self, t_states: u32) {
        self.devices.ctc.advance(t_states);
        self.devices.dart.advance(t_states);
    }
}

impl InterruptLine for MtxBoard {
    fn check_interrupts(&self) -> InterruptState {
        self.chain.line_state(&self.devices, false)
    }

    fn acknowledge(&mut self) -> u8 {
        let vector = self.chain.acknowledge(&mut self.devices);
        trace!("Interrupt acknowledged, vector {vector:02X}");
        vector
    }

    fn reti(&mut self) -> bool {
        let ended = self.chain.reti(&mut self.devices);
        trace!("RETI ({})", if ended { "service ended" } else { "nothing in service" });
        ended
    }
}

// ---------------------------------------------------------------------------
// Save state
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct MtxState {
    cpu: Z80State,
    ctc: Ctc,
    dart: Dart,
    iobyte: u8,
    ram: Vec<u8>,
    fault: Option<ConfigError>,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Memotech MTX 500/512
///
/// Hardware: Z80A @ 4 MHz, Z80 CTC, optional Z80 DART serial board. 8KB OS
/// ROM, eight pageable 8KB ROM slots, 16KB common RAM plus up to sixteen
/// 32KB pageable RAM banks. Video, sound, keyboard and disk are not
/// emulated.
pub struct MtxSystem {
    cpu: Z80,
    board: MtxBoard,
}

impl MtxSystem {
    pub fn new(config: &BoardConfig) -> Self {
        let mut cpu = Z80::new();
        cpu.reset();
        Self {
            cpu,
            board: MtxBoard::new(config),
        }
    }

    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        self.board.os_rom = MTX_OS_ROM.load(rom_set)?;
        self.board.paged_rom = MTX_PAGED_ROMS.load(rom_set)?;
        Ok(())
    }

    /// Execute one instruction (or interrupt response) and report any
    /// peripheral fault it caused.
    pub fn step(&mut self) -> Result<u32, MachineError> {
        let t_states = self.cpu.step(&mut self.board);
        self.check_fault()?;
        Ok(t_states)
    }

    fn check_fault(&self) -> Result<(), MachineError> {
        match &self.board.fault {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    pub fn get_cpu_state(&self) -> Z80State {
        self.cpu.snapshot()
    }

    /// Read memory as the CPU currently sees it.
    pub fn peek(&self, addr: u16) -> u8 {
        self.board.peek(addr)
    }

    /// Write memory as the CPU would (ROM writes are dropped).
    pub fn poke(&mut self, addr: u16, data: u8) {
        self.board.poke(addr, data);
    }

    pub fn iobyte(&self) -> u8 {
        self.board.iobyte
    }

    pub fn ram_pages(&self) -> usize {
        self.board.ram_pages
    }

    pub fn ctc(&self) -> &Ctc {
        &self.board.devices.ctc
    }

    pub fn dart(&self) -> &Dart {
        &self.board.devices.dart
    }

    pub fn daisy_order(&self) -> &[MtxDevice] {
        self.board.chain.order()
    }

    pub fn fault(&self) -> Option<&ConfigError> {
        self.board.fault.as_ref()
    }
}

impl Machine for MtxSystem {
    fn run_frame(&mut self) -> Result<(), MachineError> {
        self.check_fault()?;
        self.cpu.icount += FRAME_T_STATES as i32;
        while self.cpu.icount > 0 {
            self.step()?;
        }
        self.board.devices.ctc.trigger(CTC_FRAME_CHANNEL);
        Ok(())
    }

    fn frame_t_states(&self) -> u32 {
        FRAME_T_STATES
    }

    fn serial_rx(&mut self, channel: usize, byte: u8) -> bool {
        let dart = &mut self.board.devices.dart;
        if !dart.rx_ready(channel) {
            return false;
        }
        dart.rx_byte(channel, byte);
        true
    }

    fn serial_tx(&mut self, channel: usize) -> Option<u8> {
        self.board.devices.dart.tx_ready(channel)
    }

    fn save_state(&self) -> Result<Vec<u8>, MachineError> {
        let state = MtxState {
            cpu: self.cpu.snapshot(),
            ctc: self.board.devices.ctc.clone(),
            dart: self.board.devices.dart.clone(),
            iobyte: self.board.iobyte,
            ram: self.board.ram.clone(),
            fault: self.board.fault.clone(),
        };
        serde_json::to_vec(&state).map_err(|e| MachineError::State(e.to_string()))
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), MachineError> {
        let state: MtxState =
            serde_json::from_slice(data).map_err(|e| MachineError::State(e.to_string()))?;
        if state.ram.len() != self.board.ram.len() {
            return Err(MachineError::State(format!(
                "RAM size {} does not match this board ({})",
                state.ram.len(),
                self.board.ram.len()
            )));
        }
        self.cpu.restore(&state.cpu);
        self.board.devices.ctc = state.ctc;
        self.board.devices.dart = state.dart;
        self.board.iobyte = state.iobyte;
        self.board.ram = state.ram;
        self.board.fault = state.fault;
        self.board.sync_dart_clocks();
        Ok(())
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.icount = 0;
        self.board.reset();
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_machine(
    rom_set: &RomSet,
    config: &BoardConfig,
) -> Result<Box<dyn Machine>, RomLoadError> {
    let mut sys = MtxSystem::new(config);
    sys.load_rom_set(rom_set)?;
    Ok(Box::new(sys))
}

inventory::submit! {
    MachineEntry::new("mtx500", "mtx", 2, create_machine)
}

inventory::submit! {
    MachineEntry::new("mtx512", "mtx", 4, create_machine)
}
