mod alu;
mod bit;
mod block;
mod branch;
mod disasm;
mod load_store;
mod stack;
pub mod tables;

pub use disasm::disassemble_one;

use serde::{Deserialize, Serialize};

use crate::core::{Bus, InterruptLine};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, Z80State},
};
use tables::{CYCLES_ED, CYCLES_MAIN, CYCLES_XX, CYCLES_XXCB, PREFIX};

/// Everything the Z80 needs from the board: memory and port access plus the
/// interrupt arbiter. Blanket-implemented for any type providing both.
pub trait Z80Bus: Bus<Address = u16, Data = u8> + InterruptLine {}

impl<T: Bus<Address = u16, Data = u8> + InterruptLine + ?Sized> Z80Bus for T {}

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptMode {
    #[default]
    Im0,
    Im1,
    Im2,
}

pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,
    pub halted: bool,
    pub ei_delay: bool,
    /// Remaining T-state budget. The run loop continues while positive.
    pub icount: i32,

    // Prefix handling
    pub(crate) index_mode: IndexMode,

    // Interrupt state
    pub(crate) nmi_previous: bool,

    // T-states charged by the current step()
    cycles: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IndexMode {
    HL,
    IX,
    IY,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            a_prime: 0xFF,
            f_prime: 0xFF,
            b_prime: 0xFF,
            c_prime: 0xFF,
            d_prime: 0xFF,
            e_prime: 0xFF,
            h_prime: 0xFF,
            l_prime: 0xFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0x0000,
            iff1: false,
            iff2: false,
            im: InterruptMode::Im0,
            halted: false,
            ei_delay: false,
            icount: 0,
            index_mode: IndexMode::HL,
            nmi_previous: false,
            cycles: 0,
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    pub fn get_af(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_af(&mut self, val: u16) { self.a = (val >> 8) as u8; self.f = val as u8; }

    pub(crate) fn flag(&self, flag: Flag) -> bool {
        (self.f & flag as u8) != 0
    }

    /// Get 8-bit register by index, respecting IX/IY prefix for H/L (undocumented IXH/IXL/IYH/IYL).
    /// Index 6 is NOT handled here: callers must handle (HL)/(IX+d)/(IY+d) separately.
    pub fn get_reg8_ix(&self, index: u8) -> u8 {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => (self.ix >> 8) as u8,
            (5, IndexMode::IX) => self.ix as u8,
            (4, IndexMode::IY) => (self.iy >> 8) as u8,
            (5, IndexMode::IY) => self.iy as u8,
            _ => self.get_reg8(index),
        }
    }

    pub fn set_reg8_ix(&mut self, index: u8, val: u8) {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => self.ix = (self.ix & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IX) => self.ix = (self.ix & 0xFF00) | val as u16,
            (4, IndexMode::IY) => self.iy = (self.iy & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IY) => self.iy = (self.iy & 0xFF00) | val as u16,
            _ => self.set_reg8(index, val),
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    /// Index 2 respects current index_mode for DD/FD prefixed instructions.
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_index_reg(),
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    /// Set 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_index_reg(val),
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        match index {
            3 => self.get_af(),
            _ => self.get_rp(index),
        }
    }

    /// Set 16-bit register pair by index for PUSH/POP (0=BC, 1=DE, 2=HL/IX/IY, 3=AF).
    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        match index {
            3 => self.set_af(val),
            _ => self.set_rp(index, val),
        }
    }

    /// HL, IX or IY depending on the active prefix.
    pub(crate) fn get_index_reg(&self) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            IndexMode::IX => self.ix,
            IndexMode::IY => self.iy,
        }
    }

    pub(crate) fn set_index_reg(&mut self, val: u16) {
        match self.index_mode {
            IndexMode::HL => self.set_hl(val),
            IndexMode::IX => self.ix = val,
            IndexMode::IY => self.iy = val,
        }
    }

    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    // --- Bus access ---

    /// Charge T-states against the budget and let the board clock its
    /// peripherals by the same amount.
    pub(crate) fn elapse<B: Z80Bus + ?Sized>(&mut self, bus: &mut B, t_states: u32) {
        self.icount -= t_states as i32;
        self.cycles += t_states;
        bus.elapse(t_states);
    }

    /// Memory refresh: low 7 bits of R count M1 cycles, bit 7 is preserved.
    pub(crate) fn refresh(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// Opcode fetch (M1).
    pub(crate) fn fetch_op<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let op = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.refresh();
        op
    }

    /// Operand fetch (not M1, R untouched).
    pub(crate) fn fetch_byte<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let val = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        val
    }

    pub(crate) fn fetch_word<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn read_word<B: Z80Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr) as u16;
        let hi = bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn write_word<B: Z80Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, val: u16) {
        bus.write(addr, val as u8);
        bus.write(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Address of the memory operand: (HL), or (IX+d)/(IY+d) with the
    /// displacement fetched from the instruction stream.
    pub(crate) fn operand_addr<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            _ => {
                let d = self.fetch_byte(bus) as i8;
                self.get_index_reg().wrapping_add(d as i16 as u16)
            }
        }
    }

    // --- Execution ---

    /// Execute one instruction, or accept one interrupt, and return the
    /// T-states it took. A repeating block instruction keeps iterating while
    /// budget remains and counts as one step.
    pub fn step<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        self.cycles = 0;

        if self.ei_delay {
            // EI delay: skip interrupt check for one instruction after EI
            self.ei_delay = false;
        } else {
            let ints = bus.check_interrupts();

            // NMI: edge-triggered (higher priority than IRQ)
            let nmi_edge = ints.nmi && !self.nmi_previous;
            self.nmi_previous = ints.nmi;

            if nmi_edge {
                self.accept_nmi(bus);
                return self.cycles;
            }

            // IRQ: level-triggered, masked by IFF1
            if ints.irq && self.iff1 {
                self.accept_irq(bus);
                return self.cycles;
            }
        }

        if self.halted {
            // HALT executes NOPs until an interrupt arrives
            self.refresh();
            self.elapse(bus, 4);
            return self.cycles;
        }

        self.index_mode = IndexMode::HL;
        let op = self.fetch_op(bus);
        self.execute(op, bus);
        self.cycles
    }

    /// Add `cycles` to the budget and step until it is used up. Returns the
    /// remaining budget, zero or negative, for the caller to carry over.
    pub fn run<B: Z80Bus + ?Sized>(&mut self, bus: &mut B, cycles: i32) -> i32 {
        self.icount += cycles;
        while self.icount > 0 {
            self.step(bus);
        }
        self.icount
    }

    fn push_pc<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let pc = self.pc;
        self.push(bus, pc);
    }

    /// NMI: 11 T. IFF1 is saved into IFF2 for RETN.
    fn accept_nmi<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        self.halted = false;
        self.refresh();
        self.iff2 = self.iff1;
        self.iff1 = false;
        self.elapse(bus, tables::NMI_CYCLES);
        self.push_pc(bus);
        self.pc = 0x0066;
    }

    /// Maskable interrupt: 13 T (IM0/IM1) or 19 T (IM2).
    fn accept_irq<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        self.halted = false;
        self.refresh();
        self.iff1 = false;
        self.iff2 = false;
        let vector = bus.acknowledge();
        match self.im {
            InterruptMode::Im0 => {
                // Only RST opcodes are honoured on the data bus; anything
                // else behaves as RST 38h.
                self.elapse(bus, tables::IM0_CYCLES);
                self.push_pc(bus);
                self.pc = if (vector & 0xC7) == 0xC7 {
                    (vector & 0x38) as u16
                } else {
                    0x0038
                };
            }
            InterruptMode::Im1 => {
                self.elapse(bus, tables::IM1_CYCLES);
                self.push_pc(bus);
                self.pc = 0x0038;
            }
            InterruptMode::Im2 => {
                self.elapse(bus, tables::IM2_CYCLES);
                self.push_pc(bus);
                let table = ((self.i as u16) << 8) | vector as u16;
                self.pc = self.read_word(bus, table);
            }
        }
    }

    /// Decode prefixes and dispatch. `op` has already been fetched.
    fn execute<B: Z80Bus + ?Sized>(&mut self, mut op: u8, bus: &mut B) {
        // DD/FD chains: only the last prefix counts, each earlier one costs 4 T
        while op == 0xDD || op == 0xFD {
            if self.index_mode != IndexMode::HL {
                self.elapse(bus, PREFIX);
            }
            self.index_mode = if op == 0xDD { IndexMode::IX } else { IndexMode::IY };
            op = self.fetch_op(bus);
        }

        match (op, self.index_mode) {
            (0xCB, IndexMode::HL) => {
                let cb = self.fetch_op(bus);
                self.execute_instruction_cb(cb, bus);
            }
            (0xCB, _) => {
                // DD CB d op: displacement first, then the opcode as data
                let addr = self.operand_addr(bus);
                let cb = self.fetch_byte(bus);
                self.elapse(bus, CYCLES_XXCB[cb as usize] as u32);
                self.execute_instruction_index_cb(cb, addr, bus);
            }
            (0xED, mode) => {
                // ED cancels a pending DD/FD
                if mode != IndexMode::HL {
                    self.elapse(bus, PREFIX);
                    self.index_mode = IndexMode::HL;
                }
                let ed = self.fetch_op(bus);
                self.execute_instruction_ed(ed, bus);
            }
            (_, IndexMode::HL) => {
                self.elapse(bus, CYCLES_MAIN[op as usize] as u32);
                self.execute_instruction(op, bus);
            }
            _ => {
                self.elapse(bus, CYCLES_XX[op as usize] as u32);
                self.execute_instruction(op, bus);
            }
        }
    }

    /// Unprefixed and DD/FD opcodes. The table cost has already been charged;
    /// conditional instructions add their taken cost.
    fn execute_instruction<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        match opcode {
            // NOP: 4 T
            0x00 => {}

            // HALT: 4 T. PC stays past HALT.
            0x76 => self.halted = true,

            // --- Load/Store ---

            // LD (BC), A: 7 T
            0x02 => bus.write(self.get_bc(), self.a),
            // LD (DE), A: 7 T
            0x12 => bus.write(self.get_de(), self.a),
            // LD (nn), HL: 16 T
            0x22 => self.op_ld_nn_hl(bus),
            // LD (nn), A: 13 T
            0x32 => self.op_ld_nn_a(bus),

            // EX AF, AF': 4 T
            0x08 => self.op_ex_af_af(),

            // LD A, (BC): 7 T
            0x0A => self.a = bus.read(self.get_bc()),
            // LD A, (DE): 7 T
            0x1A => self.a = bus.read(self.get_de()),
            // LD HL, (nn): 16 T
            0x2A => self.op_ld_hl_nn_ind(bus),
            // LD A, (nn): 13 T
            0x3A => self.op_ld_a_nn(bus),

            // LD rr, nn (0x01/0x11/0x21/0x31): 10 T
            op if (op & 0xCF) == 0x01 => self.op_ld_rr_nn(op, bus),

            // LD r, n (0x06, 0x0E, ... 0x3E): 7 T, LD (HL),n 10 T
            op if (op & 0xC7) == 0x06 => self.op_ld_r_n(op, bus),

            // LD r, r' (0x40-0x7F excluding 0x76): 4/7 T
            op if (op & 0xC0) == 0x40 => self.op_ld_r_r(op, bus),

            // LD SP, HL: 6 T
            0xF9 => self.sp = self.get_index_reg(),

            // EX DE, HL: 4 T (never indexed)
            0xEB => self.op_ex_de_hl(),
            // EXX: 4 T
            0xD9 => self.op_exx(),
            // EX (SP), HL: 19 T
            0xE3 => self.op_ex_sp_hl(bus),

            // --- Stack ---

            // PUSH rr (0xC5/D5/E5/F5): 11 T
            op if (op & 0xCF) == 0xC5 => self.op_push(op, bus),
            // POP rr (0xC1/D1/E1/F1): 10 T
            op if (op & 0xCF) == 0xC1 => self.op_pop(op, bus),

            // --- ALU ---

            // ALU A, r (0x80 - 0xBF): 4 T (reg) or 7 T ((HL))
            op if (op & 0xC0) == 0x80 => self.op_alu_r(op, bus),
            // ALU A, n (0xC6, 0xCE, ... 0xFE): 7 T
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(op, bus),

            // INC r / DEC r: 4 T (reg) or 11 T ((HL))
            op if (op & 0xC6) == 0x04 => self.op_inc_dec_r(op, bus),

            // ADD HL,rr (0x09/0x19/0x29/0x39): 11 T
            op if (op & 0xCF) == 0x09 => self.op_add_hl_rr(op),
            // INC rr / DEC rr: 6 T
            op if (op & 0xC7) == 0x03 => self.op_inc_dec_rr(op),

            // Accumulator rotates: 4 T
            0x07 => self.op_rlca(),
            0x0F => self.op_rrca(),
            0x17 => self.op_rla(),
            0x1F => self.op_rra(),

            // Misc ALU: 4 T
            0x27 => self.op_daa(),
            0x2F => self.op_cpl(),
            0x37 => self.op_scf(),
            0x3F => self.op_ccf(),

            // --- Branch/Control Flow ---

            // JP nn: 10 T
            0xC3 => self.pc = self.fetch_word(bus),
            // JP (HL): 4 T
            0xE9 => self.pc = self.get_index_reg(),
            // JR e: 12 T
            0x18 => self.op_jr_e(bus),
            // DJNZ e: 13/8 T
            0x10 => self.op_djnz(bus),
            // CALL nn: 17 T
            0xCD => self.op_call_nn(bus),
            // RET: 10 T
            0xC9 => self.pc = self.pop(bus),
            // IN A,(n): 11 T
            0xDB => self.op_in_a_n(bus),
            // OUT (n),A: 11 T
            0xD3 => self.op_out_n_a(bus),

            // DI: 4 T
            0xF3 => self.op_di(),
            // EI: 4 T
            0xFB => self.op_ei(),

            // JP cc,nn: 10 T
            op if (op & 0xC7) == 0xC2 => self.op_jp_cc_nn(op, bus),
            // JR cc,e: 12/7 T (NZ/Z/NC/C only)
            op if (op & 0xE7) == 0x20 => self.op_jr_cc_e(op, bus),
            // CALL cc,nn: 17/10 T
            op if (op & 0xC7) == 0xC4 => self.op_call_cc_nn(op, bus),
            // RET cc: 11/5 T
            op if (op & 0xC7) == 0xC0 => self.op_ret_cc(op, bus),
            // RST p: 11 T
            op if (op & 0xC7) == 0xC7 => self.op_rst(op, bus),

            // Prefixes are consumed by execute()
            _ => {}
        }
    }

    /// ED prefix dispatch. Block instructions stage their own timing; every
    /// other ED opcode is charged its table cost up front.
    fn execute_instruction_ed<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        if (0xA0..=0xBB).contains(&opcode) && (opcode & 0x04) == 0 {
            self.execute_block(opcode, bus);
            return;
        }

        self.elapse(bus, CYCLES_ED[opcode as usize] as u32);

        match opcode {
            // --- Specific ED opcodes (low 3 bits = 111) ---
            0x47 => self.i = self.a,               // LD I,A: 9T
            0x4F => self.r = self.a,               // LD R,A: 9T
            0x57 => self.op_ld_a_i(),              // LD A,I: 9T
            0x5F => self.op_ld_a_r(),              // LD A,R: 9T
            0x67 => self.op_rrd(bus),              // RRD: 18T
            0x6F => self.op_rld(bus),              // RLD: 18T

            // --- Pattern-based (40-7F range, low 3 bits 0-6) ---
            op if (op & 0xC7) == 0x40 => self.op_in_r_c(op, bus),  // IN r,(C): 12T
            op if (op & 0xC7) == 0x41 => self.op_out_c_r(op, bus), // OUT (C),r: 12T
            op if (op & 0xCF) == 0x42 => self.op_sbc_hl_rr(op),    // SBC HL,rr: 15T
            op if (op & 0xCF) == 0x43 => self.op_ld_nn_rr_ed(op, bus), // LD (nn),rr: 20T
            op if (op & 0xC7) == 0x44 => self.op_neg(),            // NEG: 8T
            0x4D => self.op_reti(bus),                             // RETI: 14T
            op if (op & 0xC7) == 0x45 => self.op_retn(bus),        // RETN: 14T
            op if (op & 0xC7) == 0x46 => self.op_im(op),           // IM 0/1/2: 8T
            op if (op & 0xCF) == 0x4A => self.op_adc_hl_rr(op),    // ADC HL,rr: 15T
            op if (op & 0xCF) == 0x4B => self.op_ld_rr_nn_ed(op, bus), // LD rr,(nn): 20T

            // ED NOP, 8 T. Undefined opcodes act as NOP.
            _ => {}
        }
    }

    fn execute_block<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        match opcode {
            0xA0 | 0xA8 => self.op_ldi_ldd(opcode, bus),   // LDI/LDD: 16T
            0xA1 | 0xA9 => self.op_cpi_cpd(opcode, bus),   // CPI/CPD: 16T
            0xA2 | 0xAA => self.op_ini_ind(opcode, bus),   // INI/IND: 16T
            0xA3 | 0xAB => self.op_outi_outd(opcode, bus), // OUTI/OUTD: 16T
            0xB0 | 0xB8 => self.op_ldir_lddr(opcode, bus), // LDIR/LDDR: 21/16T
            0xB1 | 0xB9 => self.op_cpir_cpdr(opcode, bus), // CPIR/CPDR: 21/16T
            0xB2 | 0xBA => self.op_inir_indr(opcode, bus), // INIR/INDR: 21/16T
            0xB3 | 0xBB => self.op_otir_otdr(opcode, bus), // OTIR/OTDR: 21/16T
            _ => unreachable!("not a block opcode: {:02X}", opcode),
        }
    }
}

impl Cpu for Z80 {
    fn reset(&mut self) {
        self.pc = 0x0000;
        self.a = 0xFF;
        self.f = 0xFF;
        self.sp = 0xFFFF;
        self.i = 0;
        self.r = 0;
        self.im = InterruptMode::Im0;
        self.iff1 = false;
        self.iff2 = false;
        self.halted = false;
        self.ei_delay = false;
        self.nmi_previous = false;
        self.index_mode = IndexMode::HL;
    }

    fn is_sleeping(&self) -> bool {
        self.halted
    }

    fn pc(&self) -> u16 {
        self.pc
    }
}

impl CpuStateTrait for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
            ei_delay: self.ei_delay,
            nmi_previous: self.nmi_previous,
            icount: self.icount,
        }
    }

    fn restore(&mut self, s: &Z80State) {
        self.a = s.a;
        self.f = s.f;
        self.b = s.b;
        self.c = s.c;
        self.d = s.d;
        self.e = s.e;
        self.h = s.h;
        self.l = s.l;
        self.a_prime = s.a_prime;
        self.f_prime = s.f_prime;
        self.b_prime = s.b_prime;
        self.c_prime = s.c_prime;
        self.d_prime = s.d_prime;
        self.e_prime = s.e_prime;
        self.h_prime = s.h_prime;
        self.l_prime = s.l_prime;
        self.ix = s.ix;
        self.iy = s.iy;
        self.sp = s.sp;
        self.pc = s.pc;
        self.i = s.i;
        self.r = s.r;
        self.iff1 = s.iff1;
        self.iff2 = s.iff2;
        self.im = s.im;
        self.halted = s.halted;
        self.ei_delay = s.ei_delay;
        self.nmi_previous = s.nmi_previous;
        self.icount = s.icount;
        self.index_mode = IndexMode::HL;
    }
}
