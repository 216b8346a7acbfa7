use log::trace;

use crate::cpu::z80::tables::{CALL_TAKEN, JR_TAKEN, RET_TAKEN};
use crate::cpu::z80::{Flag, InterruptMode, Z80, Z80Bus};

impl Z80 {
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),  // NZ
            1 => self.flag(Flag::Z),   // Z
            2 => !self.flag(Flag::C),  // NC
            3 => self.flag(Flag::C),   // C
            4 => !self.flag(Flag::PV), // PO (parity odd)
            5 => self.flag(Flag::PV),  // PE (parity even)
            6 => !self.flag(Flag::S),  // P (positive)
            7 => self.flag(Flag::S),   // M (minus)
            _ => unreachable!(),
        }
    }

    fn relative_target(&self, disp: u8) -> u16 {
        self.pc.wrapping_add(disp as i8 as i16 as u16)
    }

    /// JP cc,nn: 10 T whether or not taken.
    /// Opcode mask: 11 ccc 010
    pub fn op_jp_cc_nn<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        if self.eval_condition((opcode >> 3) & 0x07) {
            self.pc = addr;
        }
    }

    /// JR e: 12 T
    pub fn op_jr_e<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let disp = self.fetch_byte(bus);
        self.pc = self.relative_target(disp);
    }

    /// JR cc,e: 12 T taken, 7 T not taken (NZ/Z/NC/C only)
    /// Opcode mask: 001 cc 000
    pub fn op_jr_cc_e<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let disp = self.fetch_byte(bus);
        if self.eval_condition((opcode >> 3) & 0x03) {
            self.elapse(bus, JR_TAKEN);
            self.pc = self.relative_target(disp);
        }
    }

    /// DJNZ e: 13 T taken, 8 T not taken
    pub fn op_djnz<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let disp = self.fetch_byte(bus);
        self.b = self.b.wrapping_sub(1);
        if self.b != 0 {
            self.elapse(bus, JR_TAKEN);
            self.pc = self.relative_target(disp);
        }
    }

    /// CALL nn: 17 T
    pub fn op_call_nn<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let ret = self.pc;
        self.push(bus, ret);
        self.pc = addr;
    }

    /// CALL cc,nn: 17 T taken, 10 T not taken
    /// Opcode mask: 11 ccc 100
    pub fn op_call_cc_nn<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        if self.eval_condition((opcode >> 3) & 0x07) {
            self.elapse(bus, CALL_TAKEN);
            let ret = self.pc;
            self.push(bus, ret);
            self.pc = addr;
        }
    }

    /// RET cc: 11 T taken, 5 T not taken
    /// Opcode mask: 11 ccc 000
    pub fn op_ret_cc<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        if self.eval_condition((opcode >> 3) & 0x07) {
            self.elapse(bus, RET_TAKEN);
            self.pc = self.pop(bus);
        }
    }

    /// RST p: 11 T. Target is bits 5-3 of the opcode times 8.
    pub fn op_rst<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let ret = self.pc;
        self.push(bus, ret);
        self.pc = (opcode & 0x38) as u16;
    }

    /// DI: 4 T. Disable interrupts.
    pub fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    /// EI: 4 T. Enable interrupts (with 1-instruction delay).
    pub fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
        self.ei_delay = true;
    }

    // --- ED Control Flow ---

    /// RETN, 14 T. Pops PC and copies IFF2 → IFF1. The daisy chain is not told.
    pub fn op_retn<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        self.iff1 = self.iff2;
        self.pc = self.pop(bus);
    }

    /// RETI, 14 T. Returns like RETN, then signals end-of-service to the
    /// interrupt arbiter.
    pub fn op_reti<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        self.iff1 = self.iff2;
        self.pc = self.pop(bus);
        if !bus.reti() {
            trace!("RETI at {:04X} with no device in service", self.pc);
        }
    }

    /// IM 0/1/2, 8 T. Sets the interrupt mode.
    /// Bits 4-3: 00/01→IM 0, 10→IM 1, 11→IM 2.
    pub fn op_im(&mut self, opcode: u8) {
        self.im = match (opcode >> 3) & 0x03 {
            0 | 1 => InterruptMode::Im0,
            2 => InterruptMode::Im1,
            _ => InterruptMode::Im2,
        };
    }
}
