#![allow(dead_code)]

use mtx_machines::{BoardConfig, MtxSystem, RomSet};

/// Byte every location of the BASIC image holds.
pub const BASIC_FILL: u8 = 0xBA;
/// Byte every location of the assembler image holds.
pub const ASSEM_FILL: u8 = 0xA5;

/// ROM set with `program` at the start of the OS ROM and recognizable
/// paged ROM images.
pub fn rom_set(program: &[u8]) -> RomSet {
    let mut os = vec![0u8; 0x2000];
    os[..program.len()].copy_from_slice(program);
    let basic = vec![BASIC_FILL; 0x2000];
    let assem = vec![ASSEM_FILL; 0x2000];
    RomSet::from_slices(&[("os.rom", &os), ("basic.rom", &basic), ("assem.rom", &assem)])
}

pub fn mtx_with(config: &BoardConfig, program: &[u8]) -> MtxSystem {
    let mut sys = MtxSystem::new(config);
    sys.load_rom_set(&rom_set(program)).unwrap();
    sys
}

pub fn mtx512(program: &[u8]) -> MtxSystem {
    mtx_with(&BoardConfig::default(), program)
}

/// Step until the CPU halts.
pub fn run_to_halt(sys: &mut MtxSystem) {
    for _ in 0..10_000 {
        if sys.get_cpu_state().halted {
            return;
        }
        sys.step().unwrap();
    }
    panic!("CPU never halted");
}

/// Sets up IM 2 with CTC channel 0 counting frame pulses; the service
/// routine at 0x0040 increments the byte at 0xC100.
pub const FRAME_COUNTER_PROGRAM: &[u8] = &[
    0x31, 0x00, 0x00, // 0000 LD SP,$0000
    0x21, 0x40, 0x00, // 0003 LD HL,$0040
    0x22, 0x10, 0xC0, // 0006 LD ($C010),HL
    0x3E, 0xC0,       // 0009 LD A,$C0
    0xED, 0x47,       // 000B LD I,A
    0xED, 0x5E,       // 000D IM 2
    0x3E, 0x10,       // 000F LD A,$10
    0xD3, 0x08,       // 0011 OUT ($08),A   CTC vector
    0x3E, 0xC5,       // 0013 LD A,$C5
    0xD3, 0x08,       // 0015 OUT ($08),A   counter, int enable
    0x3E, 0x01,       // 0017 LD A,$01
    0xD3, 0x08,       // 0019 OUT ($08),A   constant 1
    0xFB,             // 001B EI
    0x76,             // 001C HALT
    0x18, 0xFD,       // 001D JR $001C
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0x3A, 0x00, 0xC1, // 0040 LD A,($C100)
    0x3C,             // 0043 INC A
    0x32, 0x00, 0xC1, // 0044 LD ($C100),A
    0xFB,             // 0047 EI
    0xED, 0x4D,       // 0048 RETI
];

/// Arms CTC channel 0 (vector 0x10) and DART channel A receive interrupts
/// (vector 0x20) with interrupts disabled, then waits for a non-zero byte at
/// 0xC0F0 before enabling them. Each service routine appends a marker at
/// 0xC100 onward: 1 for the CTC, 2 for the DART.
pub const CTC_AND_DART_PROGRAM: &[u8] = &[
    0xF3,             // 0000 DI
    0x31, 0x00, 0x00, // 0001 LD SP,$0000
    0x21, 0x50, 0x00, // 0004 LD HL,$0050
    0x22, 0x10, 0xC0, // 0007 LD ($C010),HL
    0x21, 0x60, 0x00, // 000A LD HL,$0060
    0x22, 0x20, 0xC0, // 000D LD ($C020),HL
    0x3E, 0xC0,       // 0010 LD A,$C0
    0xED, 0x47,       // 0012 LD I,A
    0xED, 0x5E,       // 0014 IM 2
    0x3E, 0x10, 0xD3, 0x08, // 0016 CTC vector $10
    0x3E, 0xC5, 0xD3, 0x08, // 001A CTC 0: counter, int enable
    0x3E, 0x01, 0xD3, 0x08, // 001E constant 1
    0x3E, 0x02, 0xD3, 0x0F, // 0022 DART B: select WR2
    0x3E, 0x20, 0xD3, 0x0F, // 0026 vector $20
    0x3E, 0x04, 0xD3, 0x0E, // 002A DART A: select WR4
    0x3E, 0x44, 0xD3, 0x0E, // 002E x16, 1 stop bit
    0x3E, 0x03, 0xD3, 0x0E, // 0032 select WR3
    0x3E, 0xC1, 0xD3, 0x0E, // 0036 8 bits, Rx enable
    0x3E, 0x01, 0xD3, 0x0E, // 003A select WR1
    0x3E, 0x18, 0xD3, 0x0E, // 003E interrupt on every character
    0x21, 0x00, 0xC1, // 0042 LD HL,$C100
    0x3A, 0xF0, 0xC0, // 0045 LD A,($C0F0)
    0xB7,             // 0048 OR A
    0x28, 0xFA,       // 0049 JR Z,$0045
    0xFB,             // 004B EI
    0x76,             // 004C HALT
    0x18, 0xFD,       // 004D JR $004C
    0x00,
    0x3E, 0x01,       // 0050 LD A,1        CTC service
    0x77,             // 0052 LD (HL),A
    0x23,             // 0053 INC HL
    0xFB,             // 0054 EI
    0xED, 0x4D,       // 0055 RETI
    0, 0, 0, 0, 0, 0, 0, 0, 0,
    0xDB, 0x0C,       // 0060 IN A,($0C)    DART service, takes the byte
    0x3E, 0x02,       // 0062 LD A,2
    0x77,             // 0064 LD (HL),A
    0x23,             // 0065 INC HL
    0xFB,             // 0066 EI
    0xED, 0x4D,       // 0067 RETI
];
