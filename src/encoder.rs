use std::collections::HashMap;

use crate::error::AsmError;
use crate::literal::parse_literal;
use crate::operand::{Operand, Statement};
use crate::symbols::PatchKind;

/// Size of the numeric value a parameterized instruction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Word = 2,
}

impl Width {
    pub fn bits(self) -> u8 {
        match self {
            Width::Byte => 8,
            Width::Word => 16,
        }
    }

    /// Little-endian bytes of `value`. Negative values are stored as two's
    /// complement, so a byte accepts -128..=255 and a word -32768..=65535.
    pub fn encode(self, value: i64) -> Result<Vec<u8>, AsmError> {
        let out_of_range = AsmError::ValueOutOfRange { value, bits: self.bits() };
        match self {
            Width::Byte if (-0x80..=0xFF).contains(&value) => Ok(vec![value as u8]),
            Width::Word if (-0x8000..=0xFFFF).contains(&value) => {
                Ok((value as u16).to_le_bytes().to_vec())
            }
            _ => Err(out_of_range),
        }
    }
}

/// Opcode prefix followed by a caller-supplied value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub prefix: Vec<u8>,
    pub width: Width,
}

/// Names the operand classifier needs to know about, plus the mnemonics
/// allowed to carry a label.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    pub registers: &'static [&'static str],
    pub conditions: &'static [&'static str],
    pub absolute_jumps: &'static [&'static str],
    pub relative_jumps: &'static [&'static str],
}

impl Vocabulary {
    pub fn register(&self, name: &str) -> Option<&'static str> {
        self.registers.iter().copied().find(|r| *r == name)
    }

    pub fn condition(&self, name: &str) -> Option<&'static str> {
        self.conditions.iter().copied().find(|c| *c == name)
    }

    pub fn jump_kind(&self, mnemonic: &str) -> Option<PatchKind> {
        if self.absolute_jumps.contains(&mnemonic) {
            Some(PatchKind::Absolute)
        } else if self.relative_jumps.contains(&mnemonic) {
            Some(PatchKind::Relative)
        } else {
            None
        }
    }
}

/// Both lookup surfaces, keyed by normalized statement text.
///
/// Fixed keys spell every operand out (`ld a,b`, `bit 3,(hl)`, `rst 38h`).
/// Parameterized keys put `*` where the value goes and `(*)` for a direct
/// address (`ld a,*`, `jp nz,*`, `ld (*),hl`).
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    vocabulary: Vocabulary,
    fixed: HashMap<String, Vec<u8>>,
    parameterized: HashMap<String, Rule>,
}

impl OpcodeTable {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            fixed: HashMap::new(),
            parameterized: HashMap::new(),
        }
    }

    pub fn insert_fixed(&mut self, key: impl Into<String>, bytes: &[u8]) {
        self.fixed.insert(key.into(), bytes.to_vec());
    }

    pub fn insert_parameterized(&mut self, key: impl Into<String>, prefix: &[u8], width: Width) {
        let rule = Rule { prefix: prefix.to_vec(), width };
        self.parameterized.insert(key.into(), rule);
    }

    pub fn fixed(&self, key: &str) -> Option<&[u8]> {
        self.fixed.get(key).map(Vec::as_slice)
    }

    pub fn parameterized(&self, key: &str) -> Option<&Rule> {
        self.parameterized.get(key)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.fixed.len() + self.parameterized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Fixed,
    Parameterized { prefix_len: usize, width: Width },
    Data,
}

/// A label the encoder replaced with a zero placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    pub label: String,
    pub kind: PatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub form: Form,
    pub fixup: Option<Fixup>,
}

pub trait Encoder {
    fn vocabulary(&self) -> &Vocabulary;
    fn encode(&self, stmt: &Statement) -> Result<Encoded, AsmError>;
}

/// Encoder driven entirely by an [`OpcodeTable`].
#[derive(Debug, Clone, Copy)]
pub struct TableEncoder<'t> {
    table: &'t OpcodeTable,
}

impl<'t> TableEncoder<'t> {
    pub fn new(table: &'t OpcodeTable) -> Self {
        Self { table }
    }

    fn fixup(&self, stmt: &Statement) -> Result<Option<Fixup>, AsmError> {
        let misplaced = || AsmError::MisplacedLabel(stmt.text.clone());
        if stmt.mnemonic.contains(':') {
            return Err(misplaced());
        }
        let last = stmt.operands.len().saturating_sub(1);
        let mut label = None;
        for (idx, op) in stmt.operands.iter().enumerate() {
            if let Operand::Label(name) = op {
                if idx != last {
                    return Err(misplaced());
                }
                label = Some(name.clone());
            }
        }
        let Some(label) = label else { return Ok(None) };
        let kind = self.table.vocabulary.jump_kind(&stmt.mnemonic).ok_or_else(misplaced)?;
        Ok(Some(Fixup { label, kind }))
    }

    fn instruction(&self, stmt: &Statement) -> Result<Encoded, AsmError> {
        if let Some(bytes) = self.table.fixed(&stmt.key()) {
            return Ok(Encoded { bytes: bytes.to_vec(), form: Form::Fixed, fixup: None });
        }
        let unrecognized = || AsmError::UnrecognizedInstruction(stmt.text.clone());
        let (key, operand) = stmt.parameterized_key().ok_or_else(unrecognized)?;
        let rule = self.table.parameterized(&key).ok_or_else(unrecognized)?;
        // labels encode as zero until the resolver patches them
        let value = match operand.value_text() {
            Some(text) => parse_literal(text)?,
            None => 0,
        };
        let mut bytes = rule.prefix.clone();
        bytes.extend(rule.width.encode(value)?);
        Ok(Encoded {
            bytes,
            form: Form::Parameterized { prefix_len: rule.prefix.len(), width: rule.width },
            fixup: None,
        })
    }

    fn define_bytes(&self, stmt: &Statement) -> Result<Encoded, AsmError> {
        if stmt.operands.is_empty() {
            return Err(AsmError::MalformedDirective(format!("`{}` needs at least one value", stmt.text)));
        }
        let mut bytes = Vec::with_capacity(stmt.operands.len());
        for op in &stmt.operands {
            let Operand::Immediate(text) = op else {
                return Err(AsmError::InvalidLiteral(op.to_string()));
            };
            bytes.extend(Width::Byte.encode(parse_literal(text)?)?);
        }
        Ok(Encoded { bytes, form: Form::Data, fixup: None })
    }

    fn define_message(&self, stmt: &Statement) -> Result<Encoded, AsmError> {
        let text = match stmt.operands.as_slice() {
            [Operand::Text(text)] => text.as_str(),
            _ => "",
        };
        let text = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        if text.is_empty() {
            return Err(AsmError::MalformedDirective(format!("`{}` needs some text", stmt.text)));
        }
        Ok(Encoded { bytes: text.as_bytes().to_vec(), form: Form::Data, fixup: None })
    }
}

impl Encoder for TableEncoder<'_> {
    fn vocabulary(&self) -> &Vocabulary {
        &self.table.vocabulary
    }

    fn encode(&self, stmt: &Statement) -> Result<Encoded, AsmError> {
        let fixup = self.fixup(stmt)?;
        let mut encoded = match stmt.mnemonic.as_str() {
            "defb" => self.define_bytes(stmt)?,
            "defm" => self.define_message(stmt)?,
            _ => self.instruction(stmt)?,
        };
        if let Some(fixup) = fixup {
            // the resolver writes right after a one-byte opcode
            let expected = Form::Parameterized { prefix_len: 1, width: fixup.kind.width() };
            if encoded.form != expected {
                return Err(AsmError::MisplacedLabel(stmt.text.clone()));
            }
            encoded.fixup = Some(fixup);
        }
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_range_checks() {
        assert_eq!(Width::Byte.encode(255).unwrap(), vec![0xff]);
        assert_eq!(Width::Byte.encode(-1).unwrap(), vec![0xff]);
        assert!(Width::Byte.encode(256).is_err());
        assert!(Width::Byte.encode(-129).is_err());
        assert_eq!(Width::Word.encode(0x1234).unwrap(), vec![0x34, 0x12]);
        assert_eq!(Width::Word.encode(0x7f).unwrap(), vec![0x7f, 0x00]);
        assert_eq!(
            Width::Word.encode(0x10000),
            Err(AsmError::ValueOutOfRange { value: 0x10000, bits: 16 })
        );
    }
}
