use mtx_core::cpu::z80::Z80;
mod common;
use common::TestBus;

fn run_one(cpu: &mut Z80, code: &[u8]) -> u32 {
    let mut bus = TestBus::new();
    bus.load(0, code);
    cpu.step(&mut bus)
}

// ============================================================
// Accumulator rotates
// ============================================================

#[test]
fn test_rlca() {
    let mut cpu = Z80::new();
    cpu.a = 0x81;
    cpu.f = 0xC4; // S, Z, PV set
    assert_eq!(run_one(&mut cpu, &[0x07]), 4);
    assert_eq!(cpu.a, 0x03);
    assert_eq!(cpu.f & 0xD7, 0xC5, "S/Z/PV preserved, C = old bit 7, H/N clear");
}

#[test]
fn test_rrca() {
    let mut cpu = Z80::new();
    cpu.a = 0x01;
    cpu.f = 0;
    run_one(&mut cpu, &[0x0F]);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.f & 0x01, 0x01);
}

#[test]
fn test_rla_through_carry() {
    let mut cpu = Z80::new();
    cpu.a = 0x80;
    cpu.f = 0x01;
    run_one(&mut cpu, &[0x17]);
    assert_eq!(cpu.a, 0x01, "Old carry enters bit 0");
    assert_eq!(cpu.f & 0x01, 0x01, "Bit 7 goes to carry");
}

#[test]
fn test_rra_through_carry() {
    let mut cpu = Z80::new();
    cpu.a = 0x02;
    cpu.f = 0x01;
    run_one(&mut cpu, &[0x1F]);
    assert_eq!(cpu.a, 0x81);
    assert_eq!(cpu.f & 0x01, 0);
}

// ============================================================
// DAA
// ============================================================

#[test]
fn test_daa_after_add() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x15;
    cpu.b = 0x27;
    bus.load(0, &[0x80, 0x27]); // ADD A,B; DAA
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x3C);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x42, "15 + 27 = 42 in BCD");
    assert_eq!(cpu.f & 0x01, 0);
}

#[test]
fn test_daa_after_sub() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x42;
    cpu.b = 0x15;
    bus.load(0, &[0x90, 0x27]); // SUB B; DAA
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x27, "42 - 15 = 27 in BCD");
    assert_ne!(cpu.f & 0x02, 0, "N stays set");
}

#[test]
fn test_daa_decimal_carry() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x99;
    cpu.b = 0x01;
    bus.load(0, &[0x80, 0x27]);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x00);
    assert_eq!(cpu.f & 0x41, 0x41, "Z and C set after 99 + 1");
}

// ============================================================
// CPL / SCF / CCF
// ============================================================

#[test]
fn test_cpl() {
    let mut cpu = Z80::new();
    cpu.a = 0x5A;
    cpu.f = 0xC5;
    run_one(&mut cpu, &[0x2F]);
    assert_eq!(cpu.a, 0xA5);
    assert_eq!(cpu.f & 0xD7, 0xC5 | 0x12, "H and N set, others kept");
}

#[test]
fn test_scf_ccf() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.f = 0x12; // H, N
    bus.load(0, &[0x37, 0x3F, 0x3F]); // SCF; CCF; CCF

    cpu.step(&mut bus);
    assert_eq!(cpu.f & 0x13, 0x01, "SCF: C set, H/N clear");
    cpu.step(&mut bus);
    assert_eq!(cpu.f & 0x13, 0x10, "CCF: H = old C, C cleared");
    cpu.step(&mut bus);
    assert_eq!(cpu.f & 0x13, 0x01, "CCF: C set again, H = old C (0)");
}

// ============================================================
// Exchanges
// ============================================================

#[test]
fn test_ex_af_and_exx() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x1234);
    cpu.a_prime = 0xAB;
    cpu.f_prime = 0xCD;
    cpu.set_bc(0x1111);
    cpu.set_de(0x2222);
    cpu.set_hl(0x3333);
    cpu.b_prime = 0x44;
    cpu.c_prime = 0x44;
    bus.load(0, &[0x08, 0xD9]); // EX AF,AF'; EXX

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.get_af(), 0xABCD);
    assert_eq!(cpu.a_prime, 0x12);
    assert_eq!(cpu.f_prime, 0x34);

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.get_bc(), 0x4444);
    assert_eq!(cpu.b_prime, 0x11);
    assert_eq!(cpu.d_prime, 0x22);
    assert_eq!(cpu.h_prime, 0x33);
}

#[test]
fn test_ex_de_hl_ignores_prefix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1111);
    cpu.set_hl(0x2222);
    cpu.ix = 0x3333;
    bus.load(0, &[0xDD, 0xEB]); // DD EX DE,HL

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.get_de(), 0x2222);
    assert_eq!(cpu.get_hl(), 0x1111);
    assert_eq!(cpu.ix, 0x3333, "IX is not involved");
}
