use crate::cpu::z80::tables::{ZS, ZSP};
use crate::cpu::z80::{Flag, Z80, Z80Bus};

const XY: u8 = Flag::X as u8 | Flag::Y as u8;
const SZP: u8 = Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8;

impl Z80 {
    // --- Flag Helpers ---

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = ZSP[result as usize];
        if is_and { f |= Flag::H as u8; } // AND sets H, others clear it
        // N is 0, C is 0

        // Undocumented X/Y
        f |= result & XY;
        self.f = f;
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16) + (val as u16) + (c_val as u16);
        let result = result_u16 as u8;

        let mut f = ZS[result as usize];
        if ((a & 0xF) + (val & 0xF) + c_val) > 0xF { f |= Flag::H as u8; }
        if ((a ^ result) & (val ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if result_u16 > 0xFF { f |= Flag::C as u8; }

        f |= result & XY;
        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16).wrapping_sub(val as u16).wrapping_sub(c_val as u16);
        let result = result_u16 as u8;

        let mut f = ZS[result as usize] | Flag::N as u8;
        if (a & 0xF) < ((val & 0xF) + c_val) { f |= Flag::H as u8; }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if result_u16 > 0xFF { f |= Flag::C as u8; }

        f |= result & XY;
        self.a = result;
        self.f = f;
    }

    fn do_cp(&mut self, val: u8) {
        let a = self.a;
        self.do_sub(val, false);
        self.a = a;
        // X/Y come from the operand for CP, not the result
        self.f = (self.f & !XY) | (val & XY);
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => { self.a &= val; self.update_flags_logic(self.a, true); }, // AND
            5 => { self.a ^= val; self.update_flags_logic(self.a, false); }, // XOR
            6 => { self.a |= val; self.update_flags_logic(self.a, false); }, // OR
            7 => self.do_cp(val),         // CP
            _ => unreachable!(),
        }
    }

    // --- Instructions ---

    /// ALU A, r: 4 T (reg), 7 T ((HL)), 19 T ((IX+d))
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP
    /// Opcode mask: 10 xxx zzz
    pub fn op_alu_r<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let r = opcode & 0x07;

        let val = if r == 6 {
            let addr = self.operand_addr(bus);
            bus.read(addr)
        } else {
            self.get_reg8_ix(r)
        };
        self.perform_alu_op(alu_op, val);
    }

    /// ALU A, n: 7 T
    /// Opcode mask: 11 xxx 110
    pub fn op_alu_n<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.fetch_byte(bus);
        self.perform_alu_op(alu_op, val);
    }

    /// INC/DEC r: 4 T (reg), 11 T ((HL)), 23 T ((IX+d))
    /// Opcode mask: 00 rrr 10x
    pub fn op_inc_dec_r<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let is_dec = (opcode & 0x01) != 0;

        if r == 6 {
            let addr = self.operand_addr(bus);
            let val = bus.read(addr);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            bus.write(addr, result);
        } else {
            let val = self.get_reg8_ix(r);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            self.set_reg8_ix(r, result);
        }
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = (self.f & Flag::C as u8) | ZS[result as usize]; // Preserve C
        if (val & 0xF) == 0xF { f |= Flag::H as u8; }
        if val == 0x7F { f |= Flag::PV as u8; } // Overflow 7F -> 80
        // N is 0
        f |= result & XY;
        self.f = f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8 | ZS[result as usize];
        if (val & 0xF) == 0x0 { f |= Flag::H as u8; } // Borrow from bit 4
        if val == 0x80 { f |= Flag::PV as u8; } // Overflow 80 -> 7F
        f |= result & XY;
        self.f = f;
        result
    }

    // --- 16-bit ALU ---

    /// ADD HL,rr: 11 T (15 T for IX/IY)
    /// Opcode mask: 00 rr1 001 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=SP)
    /// Flags: H = carry from bit 11, C = carry from bit 15, N = 0.
    /// S, Z, PV preserved. X/Y from high byte of result.
    pub fn op_add_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_rp(2);
        let rr = self.get_rp(rp);
        let result = (hl as u32) + (rr as u32);

        let mut f = self.f & SZP;
        if ((hl & 0x0FFF) + (rr & 0x0FFF)) > 0x0FFF { f |= Flag::H as u8; }
        if result > 0xFFFF { f |= Flag::C as u8; }
        f |= ((result >> 8) as u8) & XY;
        self.f = f;
        self.set_rp(2, result as u16);
    }

    /// ADC HL,rr: 15 T. Opcode mask: 01 rr1 010 (ED prefix)
    pub fn op_adc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_hl();
        let rr = self.get_rp(rp);
        let c = self.flag(Flag::C) as u32;
        let result = hl as u32 + rr as u32 + c;
        let res16 = result as u16;

        let mut f = 0;
        if res16 == 0 { f |= Flag::Z as u8; }
        if (res16 & 0x8000) != 0 { f |= Flag::S as u8; }
        if ((hl & 0x0FFF) as u32 + (rr & 0x0FFF) as u32 + c) > 0x0FFF { f |= Flag::H as u8; }
        if ((hl ^ res16) & (rr ^ res16) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if result > 0xFFFF { f |= Flag::C as u8; }
        f |= ((res16 >> 8) as u8) & XY;
        self.f = f;
        self.set_hl(res16);
    }

    /// SBC HL,rr: 15 T. Opcode mask: 01 rr0 010 (ED prefix)
    pub fn op_sbc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_hl();
        let rr = self.get_rp(rp);
        let c = self.flag(Flag::C) as u32;
        let result = (hl as u32).wrapping_sub(rr as u32).wrapping_sub(c);
        let res16 = result as u16;

        let mut f = Flag::N as u8;
        if res16 == 0 { f |= Flag::Z as u8; }
        if (res16 & 0x8000) != 0 { f |= Flag::S as u8; }
        if ((hl & 0x0FFF) as u32) < ((rr & 0x0FFF) as u32 + c) { f |= Flag::H as u8; }
        if ((hl ^ rr) & (hl ^ res16) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if result > 0xFFFF { f |= Flag::C as u8; }
        f |= ((res16 >> 8) as u8) & XY;
        self.f = f;
        self.set_hl(res16);
    }

    /// INC rr / DEC rr: 6 T (10 T for IX/IY)
    /// INC: 00 rr0 011, DEC: 00 rr1 011. No flags affected.
    pub fn op_inc_dec_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let is_dec = (opcode & 0x08) != 0;
        let val = self.get_rp(rp);
        let result = if is_dec { val.wrapping_sub(1) } else { val.wrapping_add(1) };
        self.set_rp(rp, result);
    }

    /// NEG: 8 T. A = 0 - A through the SUB path.
    pub fn op_neg(&mut self) {
        let val = self.a;
        self.a = 0;
        self.do_sub(val, false);
    }

    // --- Accumulator Rotates ---

    /// RLCA: 4 T.
    /// Rotate A left circular. Old bit 7 to carry and bit 0.
    /// H = 0, N = 0, C = old bit 7. X/Y from A. S, Z, PV preserved.
    pub fn op_rlca(&mut self) {
        let bit7 = (self.a >> 7) & 1;
        self.a = (self.a << 1) | bit7;
        self.set_rotate_a_flags(bit7 != 0);
    }

    /// RRCA: 4 T.
    /// Rotate A right circular. Old bit 0 to carry and bit 7.
    pub fn op_rrca(&mut self) {
        let bit0 = self.a & 1;
        self.a = (self.a >> 1) | (bit0 << 7);
        self.set_rotate_a_flags(bit0 != 0);
    }

    /// RLA: 4 T.
    /// Rotate A left through carry. Old bit 7 to C, old C to bit 0.
    pub fn op_rla(&mut self) {
        let old_carry = self.flag(Flag::C) as u8;
        let bit7 = (self.a >> 7) & 1;
        self.a = (self.a << 1) | old_carry;
        self.set_rotate_a_flags(bit7 != 0);
    }

    /// RRA: 4 T.
    /// Rotate A right through carry. Old bit 0 to C, old C to bit 7.
    pub fn op_rra(&mut self) {
        let old_carry = if self.flag(Flag::C) { 0x80u8 } else { 0 };
        let bit0 = self.a & 1;
        self.a = (self.a >> 1) | old_carry;
        self.set_rotate_a_flags(bit0 != 0);
    }

    fn set_rotate_a_flags(&mut self, carry: bool) {
        let mut f = self.f & SZP;
        if carry { f |= Flag::C as u8; }
        f |= self.a & XY;
        self.f = f;
    }

    // --- Misc ALU ---

    /// DAA: 4 T.
    /// Decimal adjust accumulator after BCD add/sub.
    pub fn op_daa(&mut self) {
        let a = self.a;
        let n = self.flag(Flag::N);
        let old_h = self.flag(Flag::H);
        let old_c = self.flag(Flag::C);

        let mut correction = 0u8;
        let mut new_c = old_c;

        if old_h || (a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if old_c || a > 0x99 {
            correction |= 0x60;
            new_c = true;
        }

        let result = if n {
            a.wrapping_sub(correction)
        } else {
            a.wrapping_add(correction)
        };

        let new_h = if n {
            old_h && (a & 0x0F) < 6
        } else {
            (a & 0x0F) > 9
        };

        self.a = result;
        let mut f = ZSP[result as usize];
        if new_c { f |= Flag::C as u8; }
        if n { f |= Flag::N as u8; }
        if new_h { f |= Flag::H as u8; }
        f |= result & XY;
        self.f = f;
    }

    /// CPL: 4 T.
    /// Complement A. Sets H and N. X/Y from A. S, Z, PV, C preserved.
    pub fn op_cpl(&mut self) {
        self.a = !self.a;
        let mut f = self.f & (SZP | Flag::C as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & XY;
        self.f = f;
    }

    /// SCF: 4 T.
    /// Set carry flag. C = 1, H = 0, N = 0. X/Y from A. S, Z, PV preserved.
    pub fn op_scf(&mut self) {
        let mut f = self.f & SZP;
        f |= Flag::C as u8;
        f |= self.a & XY;
        self.f = f;
    }

    /// CCF: 4 T.
    /// Complement carry flag. H = old C, C = ~C, N = 0. X/Y from A. S, Z, PV preserved.
    pub fn op_ccf(&mut self) {
        let old_c = self.flag(Flag::C);
        let mut f = self.f & SZP;
        if old_c { f |= Flag::H as u8; } else { f |= Flag::C as u8; }
        f |= self.a & XY;
        self.f = f;
    }
}
