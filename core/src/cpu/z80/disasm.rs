//! Single-instruction disassembler driven by the opcode tables in `tables`.

use super::tables::{CB_ROTATE, MNEMONICS_ED, MNEMONICS_MAIN, REG8, uses_memory_hl};

struct Cursor<F> {
    peek: F,
    pc: u16,
}

impl<F: Fn(u16) -> u8> Cursor<F> {
    fn byte(&mut self) -> u8 {
        let b = (self.peek)(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    fn word(&mut self) -> u16 {
        let lo = self.byte() as u16;
        let hi = self.byte() as u16;
        (hi << 8) | lo
    }

    /// Fill in `@`, `#` and `%` placeholders from the instruction stream,
    /// consuming bytes left to right.
    fn expand(&mut self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 4);
        for ch in template.chars() {
            match ch {
                '@' => out.push_str(&format!("${:02X}", self.byte())),
                '#' => out.push_str(&format!("${:04X}", self.word())),
                '%' => {
                    let d = self.byte() as i8;
                    let target = self.pc.wrapping_add(d as i16 as u16);
                    out.push_str(&format!("${:04X}", target));
                }
                _ => out.push(ch),
            }
        }
        out
    }
}

fn indexed(reg: &str, d: i8) -> String {
    if d < 0 {
        format!("({}-${:02X})", reg, -(d as i16))
    } else {
        format!("({}+${:02X})", reg, d)
    }
}

fn cb_text(op: u8, target: &str) -> String {
    let y = (op >> 3) & 0x07;
    match op >> 6 {
        0 => format!("{} {}", CB_ROTATE[y as usize], target),
        1 => format!("BIT {},{}", y, target),
        2 => format!("RES {},{}", y, target),
        _ => format!("SET {},{}", y, target),
    }
}

/// Rewrite a base-table mnemonic for a DD/FD prefix that does not address
/// memory: HL becomes IX, H/L become IXH/IXL.
fn rename_registers(template: &str, reg: &str) -> String {
    let Some((name, operands)) = template.split_once(' ') else {
        return template.to_string();
    };
    let renamed: Vec<String> = operands
        .split(',')
        .map(|operand| match operand {
            "HL" => reg.to_string(),
            "H" => format!("{}H", reg),
            "L" => format!("{}L", reg),
            other => other.to_string(),
        })
        .collect();
    format!("{} {}", name, renamed.join(","))
}

/// Disassemble the instruction at `addr`. `peek` reads memory without side
/// effects. Returns the text and the address of the following instruction.
///
/// A DD/FD prefix that is overridden by another prefix is shown on its own
/// as a `DB` byte, matching how the CPU charges it separately.
pub fn disassemble_one<F: Fn(u16) -> u8>(peek: F, addr: u16) -> (String, u16) {
    let mut cur = Cursor { peek, pc: addr };
    let mut op = cur.byte();

    let mut index = None;
    if op == 0xDD || op == 0xFD {
        let next = (cur.peek)(cur.pc);
        if matches!(next, 0xDD | 0xED | 0xFD) {
            return (format!("DB ${:02X}", op), cur.pc);
        }
        index = Some(if op == 0xDD { "IX" } else { "IY" });
        op = cur.byte();
    }

    let text = match (op, index) {
        (0xCB, None) => {
            let cb = cur.byte();
            cb_text(cb, REG8[(cb & 0x07) as usize])
        }
        (0xCB, Some(reg)) => {
            let d = cur.byte() as i8;
            let cb = cur.byte();
            let mut text = cb_text(cb, &indexed(reg, d));
            let z = cb & 0x07;
            if z != 6 && (cb >> 6) != 1 {
                // Undocumented register copy
                text.push(',');
                text.push_str(REG8[z as usize]);
            }
            text
        }
        (0xED, _) => {
            let ed = cur.byte();
            match MNEMONICS_ED[ed as usize] {
                "" => format!("DB $ED,${:02X}", ed),
                template => cur.expand(template),
            }
        }
        (_, None) => cur.expand(MNEMONICS_MAIN[op as usize]),
        (_, Some(reg)) => {
            let template = MNEMONICS_MAIN[op as usize];
            if uses_memory_hl(op) {
                let d = cur.byte() as i8;
                let template = template.replace("(HL)", &indexed(reg, d));
                cur.expand(&template)
            } else if op == 0xE9 {
                format!("JP ({})", reg)
            } else if op == 0xEB {
                // EX DE,HL ignores the prefix
                template.to_string()
            } else {
                let template = rename_registers(template, reg);
                cur.expand(&template)
            }
        }
    };

    (text, cur.pc)
}
