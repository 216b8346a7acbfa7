use mtx_core::cpu::z80::Z80;
mod common;
use common::TestBus;

// ============================================================
// IX / IY loads and arithmetic
// ============================================================

#[test]
fn test_ld_ix_iy_nn() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0x21, 0x34, 0x12, 0xFD, 0x21, 0x78, 0x56]);

    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.ix, 0x1234);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.iy, 0x5678);
    assert_eq!(cpu.get_hl(), 0xFFFF, "HL untouched");
}

#[test]
fn test_add_ix_rr() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x1000;
    cpu.set_bc(0x0234);
    bus.load(0, &[0xDD, 0x09, 0xDD, 0x29]); // ADD IX,BC; ADD IX,IX

    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.ix, 0x1234);
    cpu.step(&mut bus);
    assert_eq!(cpu.ix, 0x2468);
}

#[test]
fn test_ld_sp_ix_and_jp_ix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x4321;
    bus.load(0, &[0xFD, 0xF9, 0xFD, 0xE9]); // LD SP,IY; JP (IY)

    assert_eq!(cpu.step(&mut bus), 10);
    assert_eq!(cpu.sp, 0x4321);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.pc, 0x4321);
}

// ============================================================
// Indexed memory operands
// ============================================================

#[test]
fn test_ld_indexed_immediate() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x5000;
    bus.load(0, &[0xDD, 0x36, 0x05, 0xAB]); // LD (IX+5),$AB

    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(bus.memory[0x5005], 0xAB);
    assert_eq!(cpu.pc, 4);
}

#[test]
fn test_ld_r_negative_displacement() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x5000;
    bus.memory[0x4FFD] = 0x66;
    bus.load(0, &[0xFD, 0x46, 0xFD]); // LD B,(IY-3)

    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.b, 0x66);
}

#[test]
fn test_ld_h_indexed_loads_real_h() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x5000;
    bus.memory[0x5001] = 0x42;
    bus.load(0, &[0xDD, 0x66, 0x01, 0xDD, 0x75, 0x02]); // LD H,(IX+1); LD (IX+2),L

    cpu.step(&mut bus);
    assert_eq!(cpu.h, 0x42, "H, not IXH, is the destination");
    assert_eq!(cpu.ix, 0x5000);

    cpu.l = 0x99;
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x5002], 0x99, "L, not IXL, is the source");
}

#[test]
fn test_alu_and_inc_indexed() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x6000;
    cpu.a = 0x10;
    bus.memory[0x6003] = 0x05;
    bus.load(0, &[0xDD, 0x86, 0x03, 0xDD, 0x34, 0x03]); // ADD A,(IX+3); INC (IX+3)

    assert_eq!(cpu.step(&mut bus), 19);
    assert_eq!(cpu.a, 0x15);
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.memory[0x6003], 0x06);
}

// ============================================================
// Undocumented IXH / IXL / IYH / IYL
// ============================================================

#[test]
fn test_index_half_registers() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x12FF;
    bus.load(0, &[
        0xDD, 0x24,       // INC IXH
        0xDD, 0x2E, 0x77, // LD IXL,$77
        0xDD, 0x7C,       // LD A,IXH
        0xFD, 0x65,       // LD IYH,IYL
    ]);
    cpu.iy = 0x00AA;

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.ix, 0x13FF);
    assert_eq!(cpu.step(&mut bus), 11);
    assert_eq!(cpu.ix, 0x1377);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.a, 0x13);
    cpu.step(&mut bus);
    assert_eq!(cpu.iy, 0xAAAA);
    assert_eq!(cpu.get_hl(), 0xFFFF, "H and L untouched");
}

// ============================================================
// DD CB / FD CB
// ============================================================

#[test]
fn test_indexed_cb_rotate() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x7000;
    bus.memory[0x7002] = 0x81;
    bus.load(0, &[0xDD, 0xCB, 0x02, 0x06]); // RLC (IX+2)

    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.memory[0x7002], 0x03);
    assert_eq!(cpu.f & 0x01, 0x01);
    assert_eq!(cpu.pc, 4);
}

#[test]
fn test_indexed_cb_register_copy() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x7000;
    bus.memory[0x6FFF] = 0x01;
    bus.load(0, &[0xFD, 0xCB, 0xFF, 0xC0]); // SET 0,(IY-1),B
    bus.load(4, &[0xFD, 0xCB, 0xFF, 0xFC]); // SET 7,(IY-1),H

    cpu.step(&mut bus);
    assert_eq!(cpu.b, 0x01, "Result copied into B");
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(bus.memory[0x6FFF], 0x81);
    assert_eq!(cpu.h, 0x81, "Copy goes to H itself, not IYH");
    assert_eq!(cpu.iy, 0x7000);
}

#[test]
fn test_indexed_bit_is_20_t() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x7000;
    cpu.b = 0x55;
    bus.memory[0x7004] = 0x00;
    bus.load(0, &[0xDD, 0xCB, 0x04, 0x40]); // BIT 0,(IX+4)

    assert_eq!(cpu.step(&mut bus), 20);
    assert_eq!(cpu.f & 0x40, 0x40, "Z set");
    assert_eq!(cpu.b, 0x55, "BIT never copies into a register");
}

// ============================================================
// Prefix chains
// ============================================================

#[test]
fn test_last_prefix_wins() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xFD, 0xDD, 0x21, 0xCD, 0xAB]); // FD DD LD IX,$ABCD

    assert_eq!(cpu.step(&mut bus), 18, "Superseded prefix costs 4 T");
    assert_eq!(cpu.ix, 0xABCD);
    assert_eq!(cpu.iy, 0xFFFF);
    assert_eq!(cpu.r, 3, "Each prefix is an M1 fetch");
}

#[test]
fn test_prefix_before_ed_is_dropped() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    cpu.set_de(0x0001);
    cpu.ix = 0x5000;
    cpu.f = 0;
    bus.load(0, &[0xDD, 0xED, 0x52]); // DD SBC HL,DE

    assert_eq!(cpu.step(&mut bus), 19, "4 T for the dropped prefix plus 15 T");
    assert_eq!(cpu.get_hl(), 0x0FFF, "ED opcode acts on HL");
    assert_eq!(cpu.ix, 0x5000);
}

#[test]
fn test_prefix_on_non_hl_opcode() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x01;
    bus.load(0, &[0xDD, 0x04]); // DD INC B

    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.b, 0x02);
}

// ============================================================
// Stack with index registers
// ============================================================

#[test]
fn test_push_pop_ex_sp_index() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.ix = 0x1122;
    bus.load(0, &[
        0xDD, 0xE5, // PUSH IX
        0xFD, 0xE1, // POP IY
        0xDD, 0xE3, // EX (SP),IX
    ]);

    assert_eq!(cpu.step(&mut bus), 15);
    assert_eq!(cpu.step(&mut bus), 14);
    assert_eq!(cpu.iy, 0x1122);
    assert_eq!(cpu.sp, 0x8000);

    cpu.sp = 0x7000;
    bus.load(0x7000, &[0x44, 0x33]);
    assert_eq!(cpu.step(&mut bus), 23);
    assert_eq!(cpu.ix, 0x3344);
    assert_eq!(bus.peek_word(0x7000), 0x1122);
}
