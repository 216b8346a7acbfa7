use crate::cpu::z80::tables::{ZS, ZSP};
use crate::cpu::z80::{Flag, Z80, Z80Bus};

impl Z80 {
    /// LD r,n (7 T), LD (HL),n (10 T), LD (IX+d),n (19 T).
    /// Opcode mask: 00 rrr 110
    pub fn op_ld_r_n<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        if r == 6 {
            // Displacement precedes the immediate
            let addr = self.operand_addr(bus);
            let val = self.fetch_byte(bus);
            bus.write(addr, val);
        } else {
            let val = self.fetch_byte(bus);
            self.set_reg8_ix(r, val);
        }
    }

    /// LD r,r' (4 T), LD r,(HL) and LD (HL),r (7 T), indexed forms (19 T).
    /// Opcode mask: 01 ddd sss (0x76 is HALT, dispatched separately)
    ///
    /// With a memory operand the other register is never remapped: under DD,
    /// `LD H,(IX+d)` loads H, not IXH.
    pub fn op_ld_r_r<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let src = opcode & 0x07;
        let dst = (opcode >> 3) & 0x07;

        if src == 6 {
            let addr = self.operand_addr(bus);
            let val = bus.read(addr);
            self.set_reg8(dst, val);
        } else if dst == 6 {
            let addr = self.operand_addr(bus);
            bus.write(addr, self.get_reg8(src));
        } else {
            let val = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, val);
        }
    }

    /// LD rr, nn: 10 T (14 T for IX/IY)
    /// Opcode mask: 00 rr0 001
    pub fn op_ld_rr_nn<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.fetch_word(bus);
        self.set_rp((opcode >> 4) & 0x03, val);
    }

    /// LD A, (nn): 13 T
    pub fn op_ld_a_nn<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        self.a = bus.read(addr);
    }

    /// LD (nn), A: 13 T
    pub fn op_ld_nn_a<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        bus.write(addr, self.a);
    }

    /// LD (nn), HL: 16 T (20 T for IX/IY)
    pub fn op_ld_nn_hl<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.get_index_reg();
        self.write_word(bus, addr, val);
    }

    /// LD HL, (nn): 16 T (20 T for IX/IY)
    pub fn op_ld_hl_nn_ind<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.read_word(bus, addr);
        self.set_index_reg(val);
    }

    /// EX AF, AF': 4 T
    pub fn op_ex_af_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
    }

    /// EXX: 4 T
    pub fn op_exx(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
    }

    /// EX DE, HL: 4 T (NOT affected by DD/FD prefix)
    pub fn op_ex_de_hl(&mut self) {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
    }

    // --- Port I/O ---

    /// IN A,(n): 11 T. Port address is A:n.
    pub fn op_in_a_n<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let n = self.fetch_byte(bus);
        let port = ((self.a as u16) << 8) | n as u16;
        self.a = bus.io_read(port);
    }

    /// OUT (n),A: 11 T. Port address is A:n.
    pub fn op_out_n_a<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let n = self.fetch_byte(bus);
        let port = ((self.a as u16) << 8) | n as u16;
        bus.io_write(port, self.a);
    }

    /// IN r,(C): 12T. Port address is BC.
    /// Flags: S, Z, PV(parity) from input, H=0, N=0, C preserved. X/Y from input.
    /// For r=6 (IN F,(C)): flags affected but value not stored.
    pub fn op_in_r_c<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = bus.io_read(self.get_bc());
        let r = (opcode >> 3) & 0x07;
        if r != 6 {
            self.set_reg8(r, val);
        }
        let mut f = (self.f & Flag::C as u8) | ZSP[val as usize];
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// OUT (C),r: 12T. No flag changes.
    /// For r=6: outputs 0 (undocumented).
    pub fn op_out_c_r<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        bus.io_write(self.get_bc(), val);
    }

    // --- ED Load/Store Operations ---

    fn set_ld_a_ir_flags(&mut self) {
        let mut f = (self.f & Flag::C as u8) | ZS[self.a as usize];
        if self.iff2 { f |= Flag::PV as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// LD A,I: 9T.
    /// Flags: S, Z from I, H=0, N=0, PV=IFF2, C preserved, X/Y from I.
    pub fn op_ld_a_i(&mut self) {
        self.a = self.i;
        self.set_ld_a_ir_flags();
    }

    /// LD A,R: 9T. Flags as LD A,I.
    ///
    /// The low 7 bits come from the elapsed-cycle counter rather than the
    /// refresh count, masked to 7 bits with bit 7 kept from R. Software that
    /// seeds random numbers from R depends on this.
    pub fn op_ld_a_r(&mut self) {
        let counter = (self.icount.wrapping_neg() as u8) & 0x7F;
        self.a = (self.r & 0x80) | counter;
        self.set_ld_a_ir_flags();
    }

    /// LD (nn),rr: 20T. Opcode mask: 01 rr0 011 (ED prefix)
    pub fn op_ld_nn_rr_ed<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.get_rp((opcode >> 4) & 0x03);
        self.write_word(bus, addr, val);
    }

    /// LD rr,(nn): 20T. Opcode mask: 01 rr1 011 (ED prefix)
    pub fn op_ld_rr_nn_ed<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.read_word(bus, addr);
        self.set_rp((opcode >> 4) & 0x03, val);
    }

    // --- Nibble rotates ---

    /// S/Z from the new A, H = N = 0, C preserved. P/V is cleared.
    fn set_rxd_flags(&mut self) {
        let mut f = (self.f & Flag::C as u8) | ZS[self.a as usize];
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// RRD: 18T. Low nibble of (HL) into A, A's low nibble into the high
    /// nibble of (HL), old high nibble of (HL) down to its low nibble.
    pub fn op_rrd<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        bus.write(addr, (self.a << 4) | (mem >> 4));
        self.a = (self.a & 0xF0) | (mem & 0x0F);
        self.set_rxd_flags();
    }

    /// RLD: 18T. High nibble of (HL) into A, A's low nibble into the low
    /// nibble of (HL), old low nibble of (HL) up to its high nibble.
    pub fn op_rld<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        bus.write(addr, (mem << 4) | (self.a & 0x0F));
        self.a = (self.a & 0xF0) | (mem >> 4);
        self.set_rxd_flags();
    }
}
