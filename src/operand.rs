use std::fmt;

use crate::encoder::Vocabulary;
use crate::error::AsmError;

/// One comma-separated piece of an instruction, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(&'static str),
    Condition(&'static str),
    /// `(hl)`, `(bc)`, `(c)`, ...
    Indirect(&'static str),
    /// `(1234h)`: a memory address or port number.
    Direct(String),
    Immediate(String),
    /// `:name`, without the colon.
    Label(String),
    /// Raw remainder of a `defm` line.
    Text(String),
}

impl Operand {
    pub fn classify(token: &str, vocab: &Vocabulary) -> Result<Operand, AsmError> {
        let t = token.trim();
        if let Some(name) = t.strip_prefix(':') {
            let name = name.trim();
            if name.is_empty() {
                return Err(AsmError::EmptyLabel);
            }
            if name.contains(':') {
                return Err(AsmError::MisplacedLabel(t.to_string()));
            }
            return Ok(Operand::Label(name.to_string()));
        }
        if t.starts_with('"') {
            return Ok(Operand::Immediate(t.to_string()));
        }
        if t.contains(':') {
            return Err(AsmError::MisplacedLabel(t.to_string()));
        }
        if let Some(inner) = t.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            let inner = inner.trim();
            return Ok(match vocab.register(inner) {
                Some(r) => Operand::Indirect(r),
                None => Operand::Direct(inner.to_string()),
            });
        }
        if let Some(r) = vocab.register(t) {
            return Ok(Operand::Register(r));
        }
        if let Some(c) = vocab.condition(t) {
            return Ok(Operand::Condition(c));
        }
        Ok(Operand::Immediate(t.to_string()))
    }

    /// Anything that ends up as bytes after the opcode.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Operand::Direct(_) | Operand::Immediate(_) | Operand::Label(_))
    }

    /// Literal text of an immediate or direct operand.
    pub fn value_text(&self) -> Option<&str> {
        match self {
            Operand::Direct(t) | Operand::Immediate(t) => Some(t),
            _ => None,
        }
    }

    fn placeholder(&self) -> String {
        match self {
            Operand::Direct(_) => "(*)".to_string(),
            Operand::Immediate(_) | Operand::Label(_) => "*".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) | Operand::Condition(r) => f.write_str(r),
            Operand::Indirect(r) => write!(f, "({r})"),
            Operand::Direct(t) => write!(f, "({t})"),
            Operand::Immediate(t) | Operand::Text(t) => f.write_str(t),
            Operand::Label(name) => write!(f, ":{name}"),
        }
    }
}

/// A normalized instruction line: mnemonic plus classified operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
    /// Canonical text, used in listings and error messages.
    pub text: String,
}

impl Statement {
    pub fn parse(line: &str, vocab: &Vocabulary) -> Result<Statement, AsmError> {
        let line = line.trim();
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (line, ""),
        };
        let operands = if rest.is_empty() {
            Vec::new()
        } else if mnemonic == "defm" {
            vec![Operand::Text(rest.to_string())]
        } else {
            let pieces = split_operands(rest);
            if pieces.iter().any(|p| p.trim().is_empty()) {
                return Err(AsmError::UnrecognizedInstruction(line.to_string()));
            }
            pieces
                .into_iter()
                .map(|p| Operand::classify(p, vocab))
                .collect::<Result<Vec<_>, _>>()?
        };
        let mut stmt = Statement {
            mnemonic: mnemonic.to_string(),
            operands,
            text: String::new(),
        };
        stmt.text = stmt.key();
        Ok(stmt)
    }

    /// Lookup key with every operand spelled out.
    pub fn key(&self) -> String {
        self.join(|op| op.to_string())
    }

    /// Lookup key with the single numeric operand replaced by `*` or `(*)`.
    /// `None` when there isn't exactly one numeric operand.
    pub fn parameterized_key(&self) -> Option<(String, &Operand)> {
        let mut numeric = self.operands.iter().filter(|op| op.is_numeric());
        let operand = numeric.next()?;
        if numeric.next().is_some() {
            return None;
        }
        Some((self.join(Operand::placeholder), operand))
    }

    fn join(&self, render: impl Fn(&Operand) -> String) -> String {
        if self.operands.is_empty() {
            return self.mnemonic.clone();
        }
        let ops: Vec<String> = self.operands.iter().map(render).collect();
        format!("{} {}", self.mnemonic, ops.join(","))
    }
}

/// Split on commas that are not inside a quoted string.
pub fn split_operands(rest: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                pieces.push(&rest[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&rest[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::z80::VOCABULARY;

    fn parse(line: &str) -> Statement {
        Statement::parse(line, &VOCABULARY).unwrap()
    }

    #[test]
    fn classifies_operands() {
        let s = parse("ld (1234h),a");
        assert_eq!(s.operands, vec![Operand::Direct("1234h".into()), Operand::Register("a")]);
        assert_eq!(s.parameterized_key().map(|(k, _)| k), Some("ld (*),a".to_string()));

        let s = parse("jp  nz, :loop");
        assert_eq!(s.operands, vec![Operand::Condition("nz"), Operand::Label("loop".into())]);
        assert_eq!(s.text, "jp nz,:loop");

        let s = parse("ld (hl),b");
        assert_eq!(s.operands, vec![Operand::Indirect("hl"), Operand::Register("b")]);
        assert_eq!(s.parameterized_key(), None);
    }

    #[test]
    fn c_is_a_register() {
        assert_eq!(parse("jr c,5").operands[0], Operand::Register("c"));
    }

    #[test]
    fn quoted_comma_stays_in_operand() {
        assert_eq!(split_operands("a,\",\""), vec!["a", "\",\""]);
        assert_eq!(parse("cp \",\"").operands, vec![Operand::Immediate("\",\"".into())]);
    }

    #[test]
    fn defm_keeps_raw_text() {
        let s = parse("defm Hello, World");
        assert_eq!(s.operands, vec![Operand::Text("Hello, World".into())]);
    }

    #[test]
    fn empty_operand_is_rejected() {
        assert!(matches!(
            Statement::parse("ld a,", &VOCABULARY),
            Err(AsmError::UnrecognizedInstruction(_))
        ));
    }

    #[test]
    fn label_inside_parens_is_misplaced() {
        assert!(matches!(
            Statement::parse("ld a,(:x)", &VOCABULARY),
            Err(AsmError::MisplacedLabel(_))
        ));
    }
}
