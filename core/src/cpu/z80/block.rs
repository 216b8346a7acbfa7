use crate::cpu::z80::tables::{BLOCK_REPEAT, CYCLES_ED};
use crate::cpu::z80::{Flag, Z80, Z80Bus};

// Staged timing for block I/O. Input happens after ED + opcode + 5 internal
// + the 4 T input cycle, then 3 T for the memory store. Output happens at
// the end of the 4 T output cycle that follows the memory fetch.
const INPUT_AT: u32 = 4 + 5 + 4;
const STORE_AFTER_INPUT: u32 = 3;
const OUTPUT_AT: u32 = 4 + 5 + 3 + 4;

impl Z80 {
    fn block_delta(opcode: u8) -> u16 {
        if (opcode & 0x08) != 0 { 0xFFFF } else { 1 }
    }

    /// Charge the repeat cost and decide whether to keep looping. When the
    /// budget has run out the instruction is rewound so the next step()
    /// resumes it.
    fn block_continue<B: Z80Bus + ?Sized>(&mut self, bus: &mut B) -> bool {
        self.elapse(bus, BLOCK_REPEAT);
        if self.icount > 0 {
            true
        } else {
            self.pc = self.pc.wrapping_sub(2);
            false
        }
    }

    // --- Transfer ---

    /// One LDI/LDD transfer: (DE) <- (HL), HL/DE step, BC--.
    /// Flags: PV = BC != 0, H = N = 0, S/Z/C preserved. X/Y from (A + byte).
    fn ldi_ldd_once<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let delta = Self::block_delta(opcode);
        let val = bus.read(self.get_hl());
        bus.write(self.get_de(), val);
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_de(self.get_de().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = val.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 { f |= Flag::PV as u8; }
        // Undocumented: X = bit 3 of (A + val), Y = bit 1
        if (n & 0x08) != 0 { f |= Flag::X as u8; }
        if (n & 0x02) != 0 { f |= Flag::Y as u8; }
        self.f = f;
    }

    /// LDI/LDD: 16 T
    pub fn op_ldi_ldd<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.elapse(bus, CYCLES_ED[opcode as usize] as u32);
        self.ldi_ldd_once(opcode, bus);
    }

    /// LDIR/LDDR: 21 T per repeated iteration, 16 T for the last.
    pub fn op_ldir_lddr<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        loop {
            self.elapse(bus, CYCLES_ED[opcode as usize] as u32);
            self.ldi_ldd_once(opcode, bus);
            if self.get_bc() == 0 || !self.block_continue(bus) {
                break;
            }
        }
    }

    // --- Search ---

    /// One CPI/CPD comparison of A with (HL), HL steps, BC--.
    /// Flags: N = 1, C preserved, S/Z/H from A - (HL), PV = BC != 0.
    fn cpi_cpd_once<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let delta = Self::block_delta(opcode);
        let val = bus.read(self.get_hl());
        let result = self.a.wrapping_sub(val);
        let h = ((self.a ^ val ^ result) & 0x10) != 0;

        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let mut f = self.f & Flag::C as u8; // preserve C
        f |= Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if h { f |= Flag::H as u8; }
        if self.get_bc() != 0 { f |= Flag::PV as u8; }
        // Undocumented: X/Y from (A - val - H)
        let n = result.wrapping_sub(h as u8);
        if (n & 0x08) != 0 { f |= Flag::X as u8; }
        if (n & 0x02) != 0 { f |= Flag::Y as u8; }
        self.f = f;
    }

    /// CPI/CPD: 16 T
    pub fn op_cpi_cpd<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.elapse(bus, CYCLES_ED[opcode as usize] as u32);
        self.cpi_cpd_once(opcode, bus);
    }

    /// CPIR/CPDR: stops when BC reaches zero or the byte matches.
    pub fn op_cpir_cpdr<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        loop {
            self.elapse(bus, CYCLES_ED[opcode as usize] as u32);
            self.cpi_cpd_once(opcode, bus);
            if self.get_bc() == 0 || self.flag(Flag::Z) || !self.block_continue(bus) {
                break;
            }
        }
    }

    // --- Input ---

    fn set_block_io_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        f |= Flag::N as u8;
        if self.b == 0 { f |= Flag::Z as u8; }
        if (self.b & 0x80) != 0 { f |= Flag::S as u8; }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// One INI/IND: (HL) <- port BC, HL steps, B--.
    fn ini_ind_once<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.elapse(bus, INPUT_AT);
        let val = bus.io_read(self.get_bc());
        bus.write(self.get_hl(), val);
        self.set_hl(self.get_hl().wrapping_add(Self::block_delta(opcode)));
        self.b = self.b.wrapping_sub(1);
        self.set_block_io_flags();
        self.elapse(bus, STORE_AFTER_INPUT);
    }

    /// INI/IND: 16 T
    pub fn op_ini_ind<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.ini_ind_once(opcode, bus);
    }

    /// INIR/INDR: 21/16 T per iteration, counted in B.
    pub fn op_inir_indr<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        loop {
            self.ini_ind_once(opcode, bus);
            if self.b == 0 || !self.block_continue(bus) {
                break;
            }
        }
    }

    // --- Output ---

    /// One OUTI/OUTD: B--, port BC <- (HL), HL steps.
    fn outi_outd_once<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let val = bus.read(self.get_hl());
        self.b = self.b.wrapping_sub(1);
        self.elapse(bus, OUTPUT_AT);
        bus.io_write(self.get_bc(), val);
        self.set_hl(self.get_hl().wrapping_add(Self::block_delta(opcode)));
        self.set_block_io_flags();
    }

    /// OUTI/OUTD: 16 T
    pub fn op_outi_outd<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.outi_outd_once(opcode, bus);
    }

    /// OTIR/OTDR: 21/16 T per iteration, counted in B.
    pub fn op_otir_otdr<B: Z80Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        loop {
            self.outi_outd_once(opcode, bus);
            if self.b == 0 || !self.block_continue(bus) {
                break;
            }
        }
    }
}
