use mtx_core::cpu::z80::Z80;
mod common;
use common::TestBus;

const PV: u8 = 0x04;
const N: u8 = 0x02;
const H: u8 = 0x10;
const Z: u8 = 0x40;

// ============================================================
// LDI / LDIR / LDDR
// ============================================================

#[test]
fn test_ldi_single() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.set_de(0x5000);
    cpu.set_bc(0x0002);
    cpu.f = 0xFF;
    bus.memory[0x4000] = 0x99;
    bus.load(0, &[0xED, 0xA0]); // LDI

    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(bus.memory[0x5000], 0x99);
    assert_eq!(cpu.get_hl(), 0x4001);
    assert_eq!(cpu.get_de(), 0x5001);
    assert_eq!(cpu.get_bc(), 0x0001);
    assert_eq!(cpu.f & (PV | H | N), PV, "PV set while BC != 0, H and N cleared");
    assert_eq!(cpu.f & 0xC1, 0xC1, "S, Z and C preserved");
}

#[test]
fn test_ldir_three_bytes_is_58_t() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.set_de(0x5000);
    cpu.set_bc(3);
    bus.load(0x4000, &[1, 2, 3]);
    bus.load(0, &[0xED, 0xB0]); // LDIR
    cpu.icount = 1000;

    assert_eq!(cpu.step(&mut bus), 58, "21 + 21 + 16 T");
    assert_eq!(&bus.memory[0x5000..0x5003], &[1, 2, 3]);
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.pc, 2, "Finished LDIR falls through");
    assert_eq!(cpu.f & PV, 0, "PV clear once BC hits zero");
}

#[test]
fn test_ldir_rewinds_when_budget_spent() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.set_de(0x5000);
    cpu.set_bc(3);
    bus.load(0x4000, &[7, 8, 9]);
    bus.load(0x0100, &[0xED, 0xB0]);
    cpu.pc = 0x0100;
    cpu.icount = 0;

    assert_eq!(cpu.step(&mut bus), 21, "One iteration plus the repeat cost");
    assert_eq!(cpu.pc, 0x0100, "PC points back at the ED prefix");
    assert_eq!(cpu.get_bc(), 2);
    assert_eq!(bus.memory[0x5000], 7);
    assert_eq!(bus.memory[0x5001], 0, "Second byte not yet copied");

    // The next quantum resumes the copy
    cpu.run(&mut bus, 100);
    assert_eq!(&bus.memory[0x5000..0x5003], &[7, 8, 9]);
    assert_eq!(cpu.get_bc(), 0);
}

#[test]
fn test_lddr_copies_downward() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4002);
    cpu.set_de(0x5002);
    cpu.set_bc(3);
    bus.load(0x4000, &[0xA, 0xB, 0xC]);
    bus.load(0, &[0xED, 0xB8]); // LDDR
    cpu.icount = 1000;

    cpu.step(&mut bus);
    assert_eq!(&bus.memory[0x5000..0x5003], &[0xA, 0xB, 0xC]);
    assert_eq!(cpu.get_hl(), 0x3FFF);
    assert_eq!(cpu.get_de(), 0x4FFF);
}

// ============================================================
// CPI / CPIR
// ============================================================

#[test]
fn test_cpir_stops_on_match() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x33;
    cpu.set_hl(0x4000);
    cpu.set_bc(5);
    cpu.f = 0x01;
    bus.load(0x4000, &[0x11, 0x22, 0x33, 0x44, 0x55]);
    bus.load(0, &[0xED, 0xB1]); // CPIR
    cpu.icount = 1000;

    assert_eq!(cpu.step(&mut bus), 58, "Two repeats and the matching compare");
    assert_eq!(cpu.get_bc(), 2);
    assert_eq!(cpu.get_hl(), 0x4003, "HL points past the match");
    assert_eq!(cpu.f & (Z | PV | N), Z | PV | N);
    assert_eq!(cpu.f & 0x01, 0x01, "C preserved");
}

#[test]
fn test_cpir_exhausts_count() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0xEE;
    cpu.set_hl(0x4000);
    cpu.set_bc(4);
    bus.load(0x4000, &[1, 2, 3, 4]);
    bus.load(0, &[0xED, 0xB1]);
    cpu.icount = 1000;

    assert_eq!(cpu.step(&mut bus), 3 * 21 + 16);
    assert_eq!(cpu.get_bc(), 0);
    assert_eq!(cpu.f & (Z | PV), 0, "No match, count exhausted");
}

#[test]
fn test_cpd_half_borrow() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x10;
    cpu.set_hl(0x4000);
    cpu.set_bc(1);
    bus.memory[0x4000] = 0x01;
    bus.load(0, &[0xED, 0xA9]); // CPD

    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.get_hl(), 0x3FFF);
    assert_eq!(cpu.f & (H | PV | Z), H, "Half borrow from 0x10 - 0x01, BC now zero");
}

// ============================================================
// Block I/O
// ============================================================

#[test]
fn test_ini_flags_and_store() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0110);
    cpu.set_hl(0x6000);
    bus.ports[0x10] = 0x5A;
    bus.load(0, &[0xED, 0xA2]); // INI

    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(bus.memory[0x6000], 0x5A);
    assert_eq!(bus.io_reads, vec![(0x0110, 13)], "Port read uses B before the decrement");
    assert_eq!(cpu.b, 0);
    assert_eq!(cpu.f & (Z | N), Z | N);
}

#[test]
fn test_inir_staged_timing() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0220);
    cpu.set_hl(0x6000);
    bus.ports[0x20] = 0x77;
    bus.load(0, &[0xED, 0xB2]); // INIR
    cpu.icount = 1000;

    assert_eq!(cpu.step(&mut bus), 21 + 16);
    assert_eq!(
        bus.io_reads,
        vec![(0x0220, 13), (0x0120, 34)],
        "Each input lands 13 T into its iteration"
    );
    assert_eq!(&bus.memory[0x6000..0x6002], &[0x77, 0x77]);
    assert_eq!(cpu.b, 0);
}

#[test]
fn test_otir_staged_timing() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0230);
    cpu.set_hl(0x6000);
    bus.load(0x6000, &[0xAA, 0xBB]);
    bus.load(0, &[0xED, 0xB3]); // OTIR
    cpu.icount = 1000;

    assert_eq!(cpu.step(&mut bus), 21 + 16);
    assert_eq!(
        bus.io_writes,
        vec![(0x0130, 0xAA, 16), (0x0030, 0xBB, 37)],
        "B is decremented before the port address is driven"
    );
    assert_eq!(cpu.get_hl(), 0x6002);
    assert_eq!(cpu.f & Z, Z);
}

#[test]
fn test_otdr_direction() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0240);
    cpu.set_hl(0x6001);
    bus.load(0x6000, &[0x01, 0x02]);
    bus.load(0, &[0xED, 0xBB]); // OTDR
    cpu.icount = 1000;

    cpu.step(&mut bus);
    let data: Vec<u8> = bus.io_writes.iter().map(|w| w.1).collect();
    assert_eq!(data, vec![0x02, 0x01]);
    assert_eq!(cpu.get_hl(), 0x5FFF);
}
