use crate::cpu::z80::{Z80, Z80Bus};

impl Z80 {
    /// Push a word: high byte at SP-1, low byte at SP-2.
    pub(crate) fn push<B: Z80Bus + ?Sized>(&mut self, bus: &mut B, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, val as u8);
    }

    pub(crate) fn pop<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// PUSH rr: 11 T (15 T for IX/IY)
    /// Opcode mask: 11 rr0 101 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub fn op_push<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.get_rp_af((opcode >> 4) & 0x03);
        self.push(bus, val);
    }

    /// POP rr: 10 T (14 T for IX/IY)
    /// Opcode mask: 11 rr0 001 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub fn op_pop<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = self.pop(bus);
        self.set_rp_af((opcode >> 4) & 0x03, val);
    }

    /// EX (SP),HL: 19 T (23 T for IX/IY)
    pub fn op_ex_sp_hl<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) {
        let sp = self.sp;
        let mem = self.read_word(bus, sp);
        let reg = self.get_index_reg();
        self.write_word(bus, sp, reg);
        self.set_index_reg(mem);
    }
}
