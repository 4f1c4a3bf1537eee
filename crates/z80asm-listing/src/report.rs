use std::fmt::Write;

use serde::{Deserialize, Serialize};
use z80asm::{hex_dump, render_listing, Assembly};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineOut {
    pub line: usize,
    pub addr: u32,
    pub bytes: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolKV {
    pub name: String,
    pub ip: usize,
    pub addr: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub origin: Option<u16>,
    pub size: usize,
    pub lines: Vec<LineOut>,
    pub symbols: Vec<SymbolKV>,
}

pub fn symbol_table(asm: &Assembly) -> Vec<SymbolKV> {
    asm.symbols
        .iter()
        .map(|(name, &ip)| SymbolKV { name: name.clone(), ip, addr: asm.address_of(ip) })
        .collect()
}

pub fn build_report(asm: &Assembly) -> Report {
    let lines = asm
        .listing
        .iter()
        .map(|e| LineOut {
            line: e.line,
            addr: asm.address_of(e.ip),
            bytes: hex_dump(asm.bytes_of(e)),
            source: e.source.clone(),
        })
        .collect();
    Report {
        origin: asm.origin,
        size: asm.code.len(),
        lines,
        symbols: symbol_table(asm),
    }
}

/// Summary header, the listing, then a symbol table sorted by name.
pub fn render_text(asm: &Assembly) -> String {
    let mut buf = String::new();
    match asm.origin {
        Some(org) => {
            let _ = writeln!(buf, "; origin {org:#06x}, {} bytes", asm.code.len());
        }
        None => {
            let _ = writeln!(buf, "; no origin, {} bytes", asm.code.len());
        }
    }
    buf.push_str(&render_listing(asm));
    if !asm.symbols.is_empty() {
        let _ = writeln!(buf);
        let _ = writeln!(buf, "{:<16} {:<6} {}", "symbol", "ip", "addr");
        for s in symbol_table(asm) {
            let _ = writeln!(buf, "{:<16} {:<6} {:04x}", s.name, s.ip, s.addr);
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_addresses_follow_origin() {
        let asm = z80asm::assemble("org 1000h\ncall :sub\nnop\n:sub\nret").unwrap();
        let report = build_report(&asm);
        assert_eq!(report.size, 5);
        assert_eq!(report.lines[0].bytes, "cd 04 10");
        assert_eq!(report.lines[2].addr, 0x1004);
        assert_eq!(
            report.symbols,
            vec![SymbolKV { name: "sub".into(), ip: 4, addr: 0x1004 }]
        );
    }

    #[test]
    fn text_has_symbol_table() {
        let asm = z80asm::assemble(":top\njr :top").unwrap();
        let text = render_text(&asm);
        assert!(text.starts_with("; no origin, 2 bytes\n"));
        assert!(text.contains("0000  18 fe        jr :top"));
        assert!(text.ends_with("top              0      0000\n"));
    }
}
