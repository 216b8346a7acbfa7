//! Opcode tables shared by the executor and the disassembler.
//!
//! Every table is indexed by the opcode byte that follows the prefix, so the
//! cycle cost and mnemonic of an instruction always come from the same slot.
//! Cycle counts are documented totals including prefix bytes; conditional
//! instructions hold the not-taken cost and the executor adds the extra.

use super::Flag;

/// Extra T-states when a conditional branch is taken.
pub const JR_TAKEN: u32 = 5; // JR cc / DJNZ
pub const CALL_TAKEN: u32 = 7;
pub const RET_TAKEN: u32 = 6;
/// Extra T-states when a block instruction repeats.
pub const BLOCK_REPEAT: u32 = 5;
/// Cost of a DD/FD prefix that a later prefix overrides.
pub const PREFIX: u32 = 4;

pub const NMI_CYCLES: u32 = 11;
pub const IM0_CYCLES: u32 = 13;
pub const IM1_CYCLES: u32 = 13;
pub const IM2_CYCLES: u32 = 19;

/// Unprefixed opcodes.
#[rustfmt::skip]
pub const CYCLES_MAIN: [u8; 256] = [
    4, 10,  7,  6,  4,  4,  7,  4,  4, 11,  7,  6,  4,  4,  7,  4, // 00
    8, 10,  7,  6,  4,  4,  7,  4, 12, 11,  7,  6,  4,  4,  7,  4, // 10
    7, 10, 16,  6,  4,  4,  7,  4,  7, 11, 16,  6,  4,  4,  7,  4, // 20
    7, 10, 13,  6, 11, 11, 10,  4,  7, 11, 13,  6,  4,  4,  7,  4, // 30
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 40
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 50
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 60
    7,  7,  7,  7,  7,  7,  4,  7,  4,  4,  4,  4,  4,  4,  7,  4, // 70
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 80
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 90
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // A0
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // B0
    5, 10, 10, 10, 10, 11,  7, 11,  5, 10, 10,  4, 10, 17,  7, 11, // C0
    5, 10, 10, 11, 10, 11,  7, 11,  5,  4, 10, 11, 10,  4,  7, 11, // D0
    5, 10, 10, 19, 10, 11,  7, 11,  5,  4, 10,  4, 10,  4,  7, 11, // E0
    5, 10, 10,  4, 10, 11,  7, 11,  5,  6, 10,  4, 10,  4,  7, 11, // F0
];

/// True for opcodes whose operand is the memory byte at (HL), which becomes
/// (IX+d)/(IY+d) under a DD/FD prefix and carries a displacement byte.
pub const fn uses_memory_hl(op: u8) -> bool {
    match op {
        0x34 | 0x35 | 0x36 => true,
        0x76 => false,
        0x40..=0x7F => (op & 0x07) == 6 || ((op >> 3) & 0x07) == 6,
        0x80..=0xBF => (op & 0x07) == 6,
        _ => false,
    }
}

const fn build_xx() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let op = i as u8;
        let mut c = CYCLES_MAIN[i] + 4;
        if op == 0x36 {
            c += 5;
        } else if uses_memory_hl(op) {
            c += 8;
        }
        t[i] = c;
        i += 1;
    }
    t
}

/// DD/FD-prefixed opcodes. Opcodes that do not touch HL pay for the prefix
/// and otherwise behave as unprefixed.
pub const CYCLES_XX: [u8; 256] = build_xx();

const fn build_cb() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = if (i & 0x07) != 6 {
            8
        } else if (i & 0xC0) == 0x40 {
            12
        } else {
            15
        };
        i += 1;
    }
    t
}

/// CB-prefixed opcodes.
pub const CYCLES_CB: [u8; 256] = build_cb();

const fn build_xxcb() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = if (i & 0xC0) == 0x40 { 20 } else { 23 };
        i += 1;
    }
    t
}

/// DD CB d op / FD CB d op.
pub const CYCLES_XXCB: [u8; 256] = build_xxcb();

const fn build_ed() -> [u8; 256] {
    let mut t = [8u8; 256];
    let mut i = 0x40;
    while i < 0x80 {
        t[i] = match i & 0x07 {
            0 | 1 => 12,
            2 => 15,
            3 => 20,
            4 | 6 => 8,
            5 => 14,
            _ => match i {
                0x47 | 0x4F | 0x57 | 0x5F => 9,
                0x67 | 0x6F => 18,
                _ => 8,
            },
        };
        i += 1;
    }
    let mut op = 0xA0;
    while op < 0xC0 {
        if (op & 0x04) == 0 {
            t[op] = 16;
        }
        op += 1;
    }
    t
}

/// ED-prefixed opcodes. Undefined slots are 8 T-state no-ops.
pub const CYCLES_ED: [u8; 256] = build_ed();

const fn build_zs() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut f = 0;
        if i == 0 {
            f |= Flag::Z as u8;
        }
        if (i & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        t[i] = f;
        i += 1;
    }
    t
}

const fn build_zsp() -> [u8; 256] {
    let mut t = build_zs();
    let mut i = 0;
    while i < 256 {
        if (i as u8).count_ones() % 2 == 0 {
            t[i] |= Flag::PV as u8;
        }
        i += 1;
    }
    t
}

/// S and Z for every byte value.
pub const ZS: [u8; 256] = build_zs();
/// S, Z and even parity (P/V) for every byte value.
pub const ZSP: [u8; 256] = build_zsp();

// --- Mnemonics ---
//
// Operand placeholders: `@` immediate byte, `#` immediate word, `%` relative
// jump target. `HL`, `H`, `L` and `(HL)` are rewritten under DD/FD.

#[rustfmt::skip]
pub const MNEMONICS_MAIN: [&str; 256] = [
    "NOP",        "LD BC,#",    "LD (BC),A",  "INC BC",     "INC B",      "DEC B",      "LD B,@",     "RLCA",
    "EX AF,AF'",  "ADD HL,BC",  "LD A,(BC)",  "DEC BC",     "INC C",      "DEC C",      "LD C,@",     "RRCA",
    "DJNZ %",     "LD DE,#",    "LD (DE),A",  "INC DE",     "INC D",      "DEC D",      "LD D,@",     "RLA",
    "JR %",       "ADD HL,DE",  "LD A,(DE)",  "DEC DE",     "INC E",      "DEC E",      "LD E,@",     "RRA",
    "JR NZ,%",    "LD HL,#",    "LD (#),HL",  "INC HL",     "INC H",      "DEC H",      "LD H,@",     "DAA",
    "JR Z,%",     "ADD HL,HL",  "LD HL,(#)",  "DEC HL",     "INC L",      "DEC L",      "LD L,@",     "CPL",
    "JR NC,%",    "LD SP,#",    "LD (#),A",   "INC SP",     "INC (HL)",   "DEC (HL)",   "LD (HL),@",  "SCF",
    "JR C,%",     "ADD HL,SP",  "LD A,(#)",   "DEC SP",     "INC A",      "DEC A",      "LD A,@",     "CCF",
    "LD B,B",     "LD B,C",     "LD B,D",     "LD B,E",     "LD B,H",     "LD B,L",     "LD B,(HL)",  "LD B,A",
    "LD C,B",     "LD C,C",     "LD C,D",     "LD C,E",     "LD C,H",     "LD C,L",     "LD C,(HL)",  "LD C,A",
    "LD D,B",     "LD D,C",     "LD D,D",     "LD D,E",     "LD D,H",     "LD D,L",     "LD D,(HL)",  "LD D,A",
    "LD E,B",     "LD E,C",     "LD E,D",     "LD E,E",     "LD E,H",     "LD E,L",     "LD E,(HL)",  "LD E,A",
    "LD H,B",     "LD H,C",     "LD H,D",     "LD H,E",     "LD H,H",     "LD H,L",     "LD H,(HL)",  "LD H,A",
    "LD L,B",     "LD L,C",     "LD L,D",     "LD L,E",     "LD L,H",     "LD L,L",     "LD L,(HL)",  "LD L,A",
    "LD (HL),B",  "LD (HL),C",  "LD (HL),D",  "LD (HL),E",  "LD (HL),H",  "LD (HL),L",  "HALT",       "LD (HL),A",
    "LD A,B",     "LD A,C",     "LD A,D",     "LD A,E",     "LD A,H",     "LD A,L",     "LD A,(HL)",  "LD A,A",
    "ADD A,B",    "ADD A,C",    "ADD A,D",    "ADD A,E",    "ADD A,H",    "ADD A,L",    "ADD A,(HL)", "ADD A,A",
    "ADC A,B",    "ADC A,C",    "ADC A,D",    "ADC A,E",    "ADC A,H",    "ADC A,L",    "ADC A,(HL)", "ADC A,A",
    "SUB B",      "SUB C",      "SUB D",      "SUB E",      "SUB H",      "SUB L",      "SUB (HL)",   "SUB A",
    "SBC A,B",    "SBC A,C",    "SBC A,D",    "SBC A,E",    "SBC A,H",    "SBC A,L",    "SBC A,(HL)", "SBC A,A",
    "AND B",      "AND C",      "AND D",      "AND E",      "AND H",      "AND L",      "AND (HL)",   "AND A",
    "XOR B",      "XOR C",      "XOR D",      "XOR E",      "XOR H",      "XOR L",      "XOR (HL)",   "XOR A",
    "OR B",       "OR C",       "OR D",       "OR E",       "OR H",       "OR L",       "OR (HL)",    "OR A",
    "CP B",       "CP C",       "CP D",       "CP E",       "CP H",       "CP L",       "CP (HL)",    "CP A",
    "RET NZ",     "POP BC",     "JP NZ,#",    "JP #",       "CALL NZ,#",  "PUSH BC",    "ADD A,@",    "RST $00",
    "RET Z",      "RET",        "JP Z,#",     "",           "CALL Z,#",   "CALL #",     "ADC A,@",    "RST $08",
    "RET NC",     "POP DE",     "JP NC,#",    "OUT (@),A",  "CALL NC,#",  "PUSH DE",    "SUB @",      "RST $10",
    "RET C",      "EXX",        "JP C,#",     "IN A,(@)",   "CALL C,#",   "",           "SBC A,@",    "RST $18",
    "RET PO",     "POP HL",     "JP PO,#",    "EX (SP),HL", "CALL PO,#",  "PUSH HL",    "AND @",      "RST $20",
    "RET PE",     "JP (HL)",    "JP PE,#",    "EX DE,HL",   "CALL PE,#",  "",           "XOR @",      "RST $28",
    "RET P",      "POP AF",     "JP P,#",     "DI",         "CALL P,#",   "PUSH AF",    "OR @",       "RST $30",
    "RET M",      "LD SP,HL",   "JP M,#",     "EI",         "CALL M,#",   "",           "CP @",       "RST $38",
];

const fn build_ed_mnemonics() -> [&'static str; 256] {
    const ROW: [[&str; 8]; 8] = [
        ["IN B,(C)", "OUT (C),B", "SBC HL,BC", "LD (#),BC", "NEG", "RETN", "IM 0", "LD I,A"],
        ["IN C,(C)", "OUT (C),C", "ADC HL,BC", "LD BC,(#)", "NEG", "RETI", "IM 0", "LD R,A"],
        ["IN D,(C)", "OUT (C),D", "SBC HL,DE", "LD (#),DE", "NEG", "RETN", "IM 1", "LD A,I"],
        ["IN E,(C)", "OUT (C),E", "ADC HL,DE", "LD DE,(#)", "NEG", "RETN", "IM 2", "LD A,R"],
        ["IN H,(C)", "OUT (C),H", "SBC HL,HL", "LD (#),HL", "NEG", "RETN", "IM 0", "RRD"],
        ["IN L,(C)", "OUT (C),L", "ADC HL,HL", "LD HL,(#)", "NEG", "RETN", "IM 0", "RLD"],
        ["IN F,(C)", "OUT (C),0", "SBC HL,SP", "LD (#),SP", "NEG", "RETN", "IM 1", ""],
        ["IN A,(C)", "OUT (C),A", "ADC HL,SP", "LD SP,(#)", "NEG", "RETN", "IM 2", ""],
    ];
    const BLOCK: [[&str; 4]; 4] = [
        ["LDI", "CPI", "INI", "OUTI"],
        ["LDD", "CPD", "IND", "OUTD"],
        ["LDIR", "CPIR", "INIR", "OTIR"],
        ["LDDR", "CPDR", "INDR", "OTDR"],
    ];
    let mut t = [""; 256];
    let mut i = 0x40;
    while i < 0x80 {
        t[i] = ROW[(i >> 3) & 0x07][i & 0x07];
        i += 1;
    }
    let mut op = 0xA0;
    while op < 0xC0 {
        if (op & 0x04) == 0 {
            t[op] = BLOCK[(op >> 3) & 0x03][op & 0x03];
        }
        op += 1;
    }
    t
}

/// ED-prefixed mnemonics; empty for undefined opcodes.
pub const MNEMONICS_ED: [&str; 256] = build_ed_mnemonics();

pub const CB_ROTATE: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];
pub const REG8: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
