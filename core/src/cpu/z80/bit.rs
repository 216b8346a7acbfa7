use crate::cpu::z80::tables::{CYCLES_CB, ZSP};
use crate::cpu::z80::{Flag, Z80, Z80Bus};

const XY: u8 = Flag::X as u8 | Flag::Y as u8;

impl Z80 {
    /// Perform CB rotate/shift operation on a value.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, new_flags). Flags: S, Z, PV(parity), C from shifted bit. H=0, N=0.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            0 => {
                // RLC: rotate left circular
                let c = (val >> 7) & 1;
                ((val << 1) | c, c)
            }
            1 => {
                // RRC: rotate right circular
                let c = val & 1;
                ((val >> 1) | (c << 7), c)
            }
            2 => {
                // RL: rotate left through carry
                let old_c = self.flag(Flag::C) as u8;
                let c = (val >> 7) & 1;
                ((val << 1) | old_c, c)
            }
            3 => {
                // RR: rotate right through carry
                let old_c = if self.flag(Flag::C) { 0x80 } else { 0 };
                let c = val & 1;
                ((val >> 1) | old_c, c)
            }
            4 => {
                // SLA: shift left arithmetic
                let c = (val >> 7) & 1;
                (val << 1, c)
            }
            5 => {
                // SRA: shift right arithmetic (preserves sign)
                let c = val & 1;
                (((val as i8) >> 1) as u8, c)
            }
            6 => {
                // SLL: shift left logical, set bit 0 (undocumented)
                let c = (val >> 7) & 1;
                ((val << 1) | 1, c)
            }
            7 => {
                // SRL: shift right logical
                let c = val & 1;
                (val >> 1, c)
            }
            _ => unreachable!(),
        };

        let mut f = ZSP[result as usize];
        if carry != 0 {
            f |= Flag::C as u8;
        }
        // H = 0, N = 0
        f |= result & XY;

        (result, f)
    }

    /// BIT b: Z = ~bit, S = bit 7 if tested, PV = Z, H=1, N=0, C preserved.
    fn do_bit(&mut self, bit: u8, val: u8, xy_source: u8) {
        let tested = val & (1 << bit);
        let mut f = self.f & Flag::C as u8; // preserve C
        f |= Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8;
            f |= Flag::PV as u8; // PV = Z for BIT
        }
        if bit == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= xy_source & XY;
        self.f = f;
    }

    /// Rotate/shift, RES or SET applied to `val`. Only rotate/shift touches flags.
    fn do_cb_modify(&mut self, xx: u8, yyy: u8, val: u8) -> u8 {
        match xx {
            0 => {
                let (result, f) = self.do_cb_rotate_shift(yyy, val);
                self.f = f;
                result
            }
            2 => val & !(1 << yyy), // RES
            3 => val | (1 << yyy),  // SET
            _ => unreachable!(),
        }
    }

    /// Execute CB-prefixed instruction.
    /// Rotate/shift: S, Z, PV(parity), C from shifted bit, H=0, N=0.
    /// BIT: see `do_bit`. SET/RES: No flags affected.
    /// Registers 8T, BIT b,(HL) 12T, rotate/shift/SET/RES (HL) 15T.
    pub fn execute_instruction_cb<B: Z80Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        self.elapse(bus, CYCLES_CB[op as usize] as u32);

        let xx = (op >> 6) & 0x03; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (op >> 3) & 0x07; // bit number or shift operation
        let zzz = op & 0x07; // register index

        if zzz == 6 {
            let addr = self.get_hl();
            let val = bus.read(addr);
            if xx == 1 {
                // X/Y from high byte of the effective address
                self.do_bit(yyy, val, (addr >> 8) as u8);
            } else {
                let result = self.do_cb_modify(xx, yyy, val);
                bus.write(addr, result);
            }
        } else {
            let val = self.get_reg8(zzz);
            if xx == 1 {
                // X/Y from the operand register value
                self.do_bit(yyy, val, val);
            } else {
                let result = self.do_cb_modify(xx, yyy, val);
                self.set_reg8(zzz, result);
            }
        }
    }

    /// DD CB d op / FD CB d op: 23T (BIT 20T), already charged by the caller.
    /// `addr` is IX+d / IY+d. Rotate/shift/SET/RES with a register field other
    /// than 6 also copy the result into that register (undocumented).
    pub fn execute_instruction_index_cb<B: Z80Bus + ?Sized>(
        &mut self,
        op: u8,
        addr: u16,
        bus: &mut B,
    ) {
        let xx = (op >> 6) & 0x03;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        let val = bus.read(addr);
        if xx == 1 {
            self.do_bit(yyy, val, (addr >> 8) as u8);
            return;
        }

        let result = self.do_cb_modify(xx, yyy, val);
        bus.write(addr, result);
        if zzz != 6 {
            self.set_reg8(zzz, result);
        }
    }
}
