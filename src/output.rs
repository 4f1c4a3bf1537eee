use std::collections::BTreeMap;
use std::fmt::Write;

use crate::assembler::{Assembly, ListingEntry};

/// Lowercase two-digit hex, space separated, no trailing newline.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub fn fmt_entry(asm: &Assembly, entry: &ListingEntry) -> String {
    let addr = asm.address_of(entry.ip);
    format!("{addr:04x}  {:<12} {}", hex_dump(asm.bytes_of(entry)), entry.source)
}

/// Address, bytes and canonical source for every emitted statement, with
/// label lines interleaved at the address they name.
pub fn render_listing(asm: &Assembly) -> String {
    let mut by_ip: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (name, ip) in &asm.symbols {
        by_ip.entry(*ip).or_default().push(name.as_str());
    }

    let mut buf = String::new();
    let mut labels = by_ip.into_iter().peekable();
    for entry in &asm.listing {
        while let Some((ip, names)) = labels.next_if(|(ip, _)| *ip <= entry.ip) {
            push_labels(&mut buf, asm, ip, &names);
        }
        let _ = writeln!(buf, "{}", fmt_entry(asm, entry));
    }
    for (ip, names) in labels {
        push_labels(&mut buf, asm, ip, &names);
    }
    buf
}

fn push_labels(buf: &mut String, asm: &Assembly, ip: usize, names: &[&str]) {
    let addr = asm.address_of(ip);
    for name in names {
        let _ = writeln!(buf, "{addr:04x}  <{name}>:");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use pretty_assertions::assert_eq;

    #[test]
    fn hex_dump_format() {
        assert_eq!(hex_dump(&[]), "");
        assert_eq!(hex_dump(&[0x3e, 0x10, 0xff]), "3e 10 ff");
    }

    #[test]
    fn listing_interleaves_labels() {
        let asm = assemble("org 8000h\n:start\nld a,10h\njr :start\n:end").unwrap();
        let expected = "\
8000  <start>:
8000  3e 10        ld a,10h
8002  18 fc        jr :start
8004  <end>:
";
        assert_eq!(render_listing(&asm), expected);
    }
}
