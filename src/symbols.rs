use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::buffer::CodeBuffer;
use crate::encoder::Width;
use crate::error::AsmError;

/// Bytes between an instruction's start and its patched operand.
pub const OPCODE_LEN: usize = 1;
/// Total length of a relative jump; offsets count from the byte after it.
pub const RELATIVE_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    Absolute,
    Relative,
}

impl PatchKind {
    pub fn width(self) -> Width {
        match self {
            PatchKind::Absolute => Width::Word,
            PatchKind::Relative => Width::Byte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub label: String,
    /// ip of the instruction, not of the operand.
    pub site: usize,
    pub kind: PatchKind,
}

/// Label name to ip. Redeclaration overwrites.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    labels: HashMap<String, usize>,
}

impl SymbolTable {
    /// Returns the previous ip when the label was already declared.
    pub fn declare(&mut self, name: &str, ip: usize) -> Option<usize> {
        self.labels.insert(name.to_string(), ip)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn sorted(&self) -> BTreeMap<String, usize> {
        self.labels.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// Pending references, grouped by kind and then by label.
#[derive(Debug, Clone, Default)]
pub struct Patches {
    absolute: BTreeMap<String, Vec<usize>>,
    relative: BTreeMap<String, Vec<usize>>,
}

impl Patches {
    pub fn record(&mut self, request: PatchRequest) {
        let map = match request.kind {
            PatchKind::Absolute => &mut self.absolute,
            PatchKind::Relative => &mut self.relative,
        };
        map.entry(request.label).or_default().push(request.site);
    }

    pub fn len(&self) -> usize {
        self.absolute.values().chain(self.relative.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every pending reference into `code`. Absolute labels are
    /// handled before relative ones, each group in label order. Returns
    /// the number of sites patched.
    pub fn resolve(
        self,
        symbols: &SymbolTable,
        origin: Option<u16>,
        code: &mut CodeBuffer,
    ) -> Result<usize, AsmError> {
        let mut patched = 0;

        for (label, sites) in self.absolute {
            let Some(org) = origin else {
                return Err(AsmError::MissingOrigin { label });
            };
            let target = symbols.get(&label).ok_or_else(|| AsmError::UnresolvedLabel(label.clone()))?;
            let addr = i64::from(org) + target as i64;
            let addr = u16::try_from(addr).map_err(|_| AsmError::ValueOutOfRange { value: addr, bits: 16 })?;
            for site in sites {
                code.patch_u16_le(site + OPCODE_LEN, addr)?;
                patched += 1;
            }
            debug!(%label, addr, "absolute patch");
        }

        for (label, sites) in self.relative {
            let target = symbols.get(&label).ok_or_else(|| AsmError::UnresolvedLabel(label.clone()))?;
            for site in sites {
                let offset = target as i64 - (site + RELATIVE_LEN) as i64;
                let byte = relative_offset(offset).ok_or_else(|| AsmError::OffsetOutOfRange {
                    label: label.clone(),
                    offset,
                })?;
                code.patch_u8(site + OPCODE_LEN, byte)?;
                patched += 1;
            }
            debug!(%label, target, "relative patch");
        }

        Ok(patched)
    }
}

/// Two's-complement byte for a jump displacement, if it fits.
pub fn relative_offset(offset: i64) -> Option<u8> {
    i8::try_from(offset).ok().map(|b| b as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(bytes: &[u8]) -> CodeBuffer {
        let mut c = CodeBuffer::new();
        c.emit(bytes);
        c
    }

    #[test]
    fn relative_offset_bounds() {
        assert_eq!(relative_offset(0), Some(0x00));
        assert_eq!(relative_offset(-2), Some(0xFE));
        assert_eq!(relative_offset(127), Some(0x7F));
        assert_eq!(relative_offset(-128), Some(0x80));
        assert_eq!(relative_offset(128), None);
        assert_eq!(relative_offset(-129), None);
    }

    #[test]
    fn missing_origin_wins_over_unresolved() {
        let mut patches = Patches::default();
        patches.record(PatchRequest { label: "nowhere".into(), site: 0, kind: PatchKind::Absolute });
        let mut c = code(&[0xC3, 0, 0]);
        let err = patches.resolve(&SymbolTable::default(), None, &mut c).unwrap_err();
        assert_eq!(err, AsmError::MissingOrigin { label: "nowhere".into() });
    }

    #[test]
    fn relative_needs_no_origin() {
        let mut symbols = SymbolTable::default();
        symbols.declare("top", 0);
        let mut patches = Patches::default();
        patches.record(PatchRequest { label: "top".into(), site: 0, kind: PatchKind::Relative });
        let mut c = code(&[0x18, 0x00]);
        assert_eq!(patches.resolve(&symbols, None, &mut c), Ok(1));
        assert_eq!(c.as_slice(), &[0x18, 0xFE]);
    }

    #[test]
    fn absolute_address_must_fit() {
        let mut symbols = SymbolTable::default();
        symbols.declare("end", 3);
        let mut patches = Patches::default();
        patches.record(PatchRequest { label: "end".into(), site: 0, kind: PatchKind::Absolute });
        let mut c = code(&[0xC3, 0, 0]);
        let err = patches.resolve(&symbols, Some(0xFFFE), &mut c).unwrap_err();
        assert_eq!(err, AsmError::ValueOutOfRange { value: 0x10001, bits: 16 });
    }
}
