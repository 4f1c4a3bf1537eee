//! Zilog Z80 instruction set, documented opcodes only.
//! IX/IY indexed forms are not included.

use std::sync::OnceLock;

use crate::encoder::{OpcodeTable, TableEncoder, Vocabulary, Width};

pub const REGISTERS: &[&str] = &[
    "a", "af", "af'", "b", "bc", "c", "d", "de", "e", "h", "hl", "l", "sp", "i", "r",
];

// `c` is listed as a register; the classifier checks registers first.
pub const CONDITIONS: &[&str] = &["nz", "z", "nc", "c", "po", "pe", "p", "m"];

pub const ABSOLUTE_JUMPS: &[&str] = &["jp", "call"];
pub const RELATIVE_JUMPS: &[&str] = &["jr", "djnz"];

pub const VOCABULARY: Vocabulary = Vocabulary {
    registers: REGISTERS,
    conditions: CONDITIONS,
    absolute_jumps: ABSOLUTE_JUMPS,
    relative_jumps: RELATIVE_JUMPS,
};

/// 8-bit operand field, `(hl)` sits in slot 6.
const R8: [(&str, u8); 8] = [
    ("b", 0),
    ("c", 1),
    ("d", 2),
    ("e", 3),
    ("h", 4),
    ("l", 5),
    ("(hl)", 6),
    ("a", 7),
];

const RP: [(&str, u8); 4] = [("bc", 0), ("de", 1), ("hl", 2), ("sp", 3)];
const RP_STACK: [(&str, u8); 4] = [("bc", 0), ("de", 1), ("hl", 2), ("af", 3)];
const CC: [(&str, u8); 8] = [
    ("nz", 0),
    ("z", 1),
    ("nc", 2),
    ("c", 3),
    ("po", 4),
    ("pe", 5),
    ("p", 6),
    ("m", 7),
];

/// Accumulator ALU group: key head and base opcode for the register form.
/// The immediate form is `base | 0x46`.
const ALU: [(&str, u8); 8] = [
    ("add a,", 0x80),
    ("adc a,", 0x88),
    ("sub ", 0x90),
    ("sbc a,", 0x98),
    ("and ", 0xA0),
    ("xor ", 0xA8),
    ("or ", 0xB0),
    ("cp ", 0xB8),
];

/// CB-prefixed rotates and shifts.
const ROT: [(&str, u8); 7] = [
    ("rlc", 0x00),
    ("rrc", 0x08),
    ("rl", 0x10),
    ("rr", 0x18),
    ("sla", 0x20),
    ("sra", 0x28),
    ("srl", 0x38),
];

const BITOPS: [(&str, u8); 3] = [("bit", 0x40), ("res", 0x80), ("set", 0xC0)];

const FIXED: &[(&str, &[u8])] = &[
    ("nop", &[0x00]),
    ("halt", &[0x76]),
    ("di", &[0xF3]),
    ("ei", &[0xFB]),
    ("exx", &[0xD9]),
    ("ex de,hl", &[0xEB]),
    ("ex af,af'", &[0x08]),
    ("ex (sp),hl", &[0xE3]),
    ("jp (hl)", &[0xE9]),
    ("ld sp,hl", &[0xF9]),
    ("ld a,(bc)", &[0x0A]),
    ("ld a,(de)", &[0x1A]),
    ("ld (bc),a", &[0x02]),
    ("ld (de),a", &[0x12]),
    ("ld a,i", &[0xED, 0x57]),
    ("ld a,r", &[0xED, 0x5F]),
    ("ld i,a", &[0xED, 0x47]),
    ("ld r,a", &[0xED, 0x4F]),
    ("rlca", &[0x07]),
    ("rrca", &[0x0F]),
    ("rla", &[0x17]),
    ("rra", &[0x1F]),
    ("daa", &[0x27]),
    ("cpl", &[0x2F]),
    ("scf", &[0x37]),
    ("ccf", &[0x3F]),
    ("ret", &[0xC9]),
    ("reti", &[0xED, 0x4D]),
    ("retn", &[0xED, 0x45]),
    ("neg", &[0xED, 0x44]),
    ("im 0", &[0xED, 0x46]),
    ("im 1", &[0xED, 0x56]),
    ("im 2", &[0xED, 0x5E]),
    ("rld", &[0xED, 0x6F]),
    ("rrd", &[0xED, 0x67]),
    ("ldi", &[0xED, 0xA0]),
    ("ldir", &[0xED, 0xB0]),
    ("ldd", &[0xED, 0xA8]),
    ("lddr", &[0xED, 0xB8]),
    ("cpi", &[0xED, 0xA1]),
    ("cpir", &[0xED, 0xB1]),
    ("cpd", &[0xED, 0xA9]),
    ("cpdr", &[0xED, 0xB9]),
    ("ini", &[0xED, 0xA2]),
    ("inir", &[0xED, 0xB2]),
    ("ind", &[0xED, 0xAA]),
    ("indr", &[0xED, 0xBA]),
    ("outi", &[0xED, 0xA3]),
    ("otir", &[0xED, 0xB3]),
    ("outd", &[0xED, 0xAB]),
    ("otdr", &[0xED, 0xBB]),
];

const PARAMETERIZED: &[(&str, &[u8], Width)] = &[
    ("jp *", &[0xC3], Width::Word),
    ("call *", &[0xCD], Width::Word),
    ("jr *", &[0x18], Width::Byte),
    ("djnz *", &[0x10], Width::Byte),
    ("ld a,(*)", &[0x3A], Width::Word),
    ("ld (*),a", &[0x32], Width::Word),
    ("ld hl,(*)", &[0x2A], Width::Word),
    ("ld (*),hl", &[0x22], Width::Word),
    ("in a,(*)", &[0xDB], Width::Byte),
    ("out (*),a", &[0xD3], Width::Byte),
];

/// The shared Z80 table, built on first use.
pub fn table() -> &'static OpcodeTable {
    static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
    TABLE.get_or_init(build)
}

pub fn encoder() -> TableEncoder<'static> {
    TableEncoder::new(table())
}

fn build() -> OpcodeTable {
    let mut t = OpcodeTable::new(VOCABULARY);

    for (key, bytes) in FIXED {
        t.insert_fixed(*key, bytes);
    }
    for (key, prefix, width) in PARAMETERIZED {
        t.insert_parameterized(*key, prefix, *width);
    }

    // 8-bit loads, inc/dec, accumulator ALU
    for (dst, d) in R8 {
        for (src, s) in R8 {
            if d == 6 && s == 6 {
                continue; // halt lives here
            }
            t.insert_fixed(format!("ld {dst},{src}"), &[0x40 | d << 3 | s]);
        }
        t.insert_parameterized(format!("ld {dst},*"), &[0x06 | d << 3], Width::Byte);
        t.insert_fixed(format!("inc {dst}"), &[0x04 | d << 3]);
        t.insert_fixed(format!("dec {dst}"), &[0x05 | d << 3]);
    }
    for (head, base) in ALU {
        for (src, s) in R8 {
            t.insert_fixed(format!("{head}{src}"), &[base | s]);
        }
        t.insert_parameterized(format!("{head}*"), &[base | 0x46], Width::Byte);
    }

    // 16-bit loads and arithmetic
    for (rp, p) in RP {
        t.insert_parameterized(format!("ld {rp},*"), &[0x01 | p << 4], Width::Word);
        t.insert_fixed(format!("inc {rp}"), &[0x03 | p << 4]);
        t.insert_fixed(format!("dec {rp}"), &[0x0B | p << 4]);
        t.insert_fixed(format!("add hl,{rp}"), &[0x09 | p << 4]);
        t.insert_fixed(format!("adc hl,{rp}"), &[0xED, 0x4A | p << 4]);
        t.insert_fixed(format!("sbc hl,{rp}"), &[0xED, 0x42 | p << 4]);
        if rp != "hl" {
            t.insert_parameterized(format!("ld {rp},(*)"), &[0xED, 0x4B | p << 4], Width::Word);
            t.insert_parameterized(format!("ld (*),{rp}"), &[0xED, 0x43 | p << 4], Width::Word);
        }
    }
    for (rp, q) in RP_STACK {
        t.insert_fixed(format!("push {rp}"), &[0xC5 | q << 4]);
        t.insert_fixed(format!("pop {rp}"), &[0xC1 | q << 4]);
    }

    // CB page
    for (r, n) in R8 {
        for (op, base) in ROT {
            t.insert_fixed(format!("{op} {r}"), &[0xCB, base | n]);
        }
        for (op, base) in BITOPS {
            for bit in 0..8u8 {
                t.insert_fixed(format!("{op} {bit},{r}"), &[0xCB, base | bit << 3 | n]);
            }
        }
    }

    // conditional flow
    for (cc, c) in CC {
        t.insert_fixed(format!("ret {cc}"), &[0xC0 | c << 3]);
        t.insert_parameterized(format!("jp {cc},*"), &[0xC2 | c << 3], Width::Word);
        t.insert_parameterized(format!("call {cc},*"), &[0xC4 | c << 3], Width::Word);
        if c < 4 {
            t.insert_parameterized(format!("jr {cc},*"), &[0x20 | c << 3], Width::Byte);
        }
    }

    // rst vectors are matched by spelling, not by value
    for vector in (0..8u8).map(|i| i * 8) {
        let op = [0xC7 | vector];
        for spelling in [
            format!("{vector:x}"),
            format!("{vector:02x}"),
            format!("{vector:x}h"),
            format!("{vector:02x}h"),
            format!("0x{vector:02x}"),
        ] {
            t.insert_fixed(format!("rst {spelling}"), &op);
        }
    }

    // port i/o through c
    for (r, n) in R8 {
        if n == 6 {
            continue;
        }
        t.insert_fixed(format!("in {r},(c)"), &[0xED, 0x40 | n << 3]);
        t.insert_fixed(format!("out (c),{r}"), &[0xED, 0x41 | n << 3]);
    }

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_spot_checks() {
        let t = table();
        assert_eq!(t.fixed("ld a,b"), Some(&[0x78][..]));
        assert_eq!(t.fixed("ld l,h"), Some(&[0x6C][..]));
        assert_eq!(t.fixed("ld (hl),a"), Some(&[0x77][..]));
        assert_eq!(t.fixed("ld (hl),(hl)"), None);
        assert_eq!(t.fixed("halt"), Some(&[0x76][..]));
        assert_eq!(t.fixed("sbc a,c"), Some(&[0x99][..]));
        assert_eq!(t.fixed("xor a"), Some(&[0xAF][..]));
        assert_eq!(t.fixed("bit 7,h"), Some(&[0xCB, 0x7C][..]));
        assert_eq!(t.fixed("set 0,(hl)"), Some(&[0xCB, 0xC6][..]));
        assert_eq!(t.fixed("push af"), Some(&[0xF5][..]));
        assert_eq!(t.fixed("ret nz"), Some(&[0xC0][..]));
        assert_eq!(t.fixed("rst 38h"), Some(&[0xFF][..]));
        assert_eq!(t.fixed("rst 0"), Some(&[0xC7][..]));
        assert_eq!(t.fixed("in b,(c)"), Some(&[0xED, 0x40][..]));
        assert_eq!(t.fixed("sbc hl,de"), Some(&[0xED, 0x52][..]));
    }

    #[test]
    fn parameterized_spot_checks() {
        let t = table();
        let rule = |k: &str| t.parameterized(k).map(|r| (r.prefix.clone(), r.width));
        assert_eq!(rule("ld a,*"), Some((vec![0x3E], Width::Byte)));
        assert_eq!(rule("ld (hl),*"), Some((vec![0x36], Width::Byte)));
        assert_eq!(rule("ld sp,*"), Some((vec![0x31], Width::Word)));
        assert_eq!(rule("cp *"), Some((vec![0xFE], Width::Byte)));
        assert_eq!(rule("jp m,*"), Some((vec![0xFA], Width::Word)));
        assert_eq!(rule("jr c,*"), Some((vec![0x38], Width::Byte)));
        assert_eq!(rule("jr po,*"), None);
        assert_eq!(rule("ld (*),de"), Some((vec![0xED, 0x53], Width::Word)));
    }
}
