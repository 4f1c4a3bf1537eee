use std::collections::HashMap;

use tracing::debug;

use crate::error::AsmError;
use crate::literal::parse_literal;

pub const COMMENT: char = ';';
pub const VARIABLE_SIGIL: char = '$';
pub const LABEL_SIGIL: char = ':';

/// What a source line turned out to be after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Variable { name: String, value: String },
    Origin(u16),
    Label(String),
    Statement(String),
}

/// Per-run line normalizer. Holds the variable table, which persists from
/// the line that defines a variable to the end of the source.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    vars: HashMap<String, String>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.vars
    }

    pub fn process(&mut self, raw: &str) -> Result<Line, AsmError> {
        let cmd = strip_comment(raw).trim();
        if cmd.is_empty() {
            return Ok(Line::Blank);
        }
        if cmd.starts_with(VARIABLE_SIGIL) {
            return self.define(cmd);
        }
        let cmd = self.substitute(cmd);
        let cmd = fold_case(cmd.trim())?;
        classify(cmd)
    }

    fn define(&mut self, cmd: &str) -> Result<Line, AsmError> {
        let (name, value) = match cmd.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (cmd, ""),
        };
        if name.len() == VARIABLE_SIGIL.len_utf8() {
            return Err(AsmError::MalformedDirective(format!("variable name missing in `{cmd}`")));
        }
        if value.is_empty() {
            return Err(AsmError::MalformedDirective(format!("variable `{name}` has no value")));
        }
        debug!(name, value, "variable defined");
        self.vars.insert(name.to_string(), value.to_string());
        Ok(Line::Variable { name: name.to_string(), value: value.to_string() })
    }

    /// One left-to-right pass. At each `$` the longest matching name wins;
    /// substituted text is not scanned again.
    fn substitute(&self, cmd: &str) -> String {
        if self.vars.is_empty() {
            return cmd.to_string();
        }
        let mut out = String::with_capacity(cmd.len());
        let mut rest = cmd;
        while let Some(pos) = rest.find(VARIABLE_SIGIL) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            let hit = self
                .vars
                .iter()
                .filter(|(name, _)| tail.starts_with(name.as_str()))
                .max_by_key(|(name, _)| name.len());
            match hit {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &tail[name.len()..];
                }
                None => {
                    out.push(VARIABLE_SIGIL);
                    rest = &tail[VARIABLE_SIGIL.len_utf8()..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Cut at the first `;` outside a quoted string.
pub fn strip_comment(raw: &str) -> &str {
    let mut quoted = false;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            COMMENT if !quoted => return &raw[..idx],
            _ => {}
        }
    }
    raw
}

/// Lowercase everything except a single quoted string. On `defm` lines
/// only the keyword is folded.
pub fn fold_case(cmd: &str) -> Result<String, AsmError> {
    if let Some(rest) = strip_keyword(cmd, "defm") {
        return Ok(format!("defm{rest}"));
    }
    let Some(open) = cmd.find('"') else {
        return Ok(cmd.to_ascii_lowercase());
    };
    let close = cmd[open + 1..]
        .find('"')
        .map(|i| open + 1 + i)
        .ok_or(AsmError::UnterminatedQuote)?;
    if cmd[close + 1..].contains('"') {
        return Err(AsmError::MultipleQuotes);
    }
    Ok(format!(
        "{}{}{}",
        cmd[..open].to_ascii_lowercase(),
        &cmd[open..=close],
        cmd[close + 1..].to_ascii_lowercase()
    ))
}

fn strip_keyword<'a>(cmd: &'a str, keyword: &str) -> Option<&'a str> {
    let head = cmd.get(..keyword.len())?;
    let rest = &cmd[keyword.len()..];
    let bounded = rest.is_empty() || rest.starts_with(char::is_whitespace);
    (head.eq_ignore_ascii_case(keyword) && bounded).then_some(rest)
}

fn classify(cmd: String) -> Result<Line, AsmError> {
    if let Some(name) = cmd.strip_prefix(LABEL_SIGIL) {
        let name = name.trim();
        if name.is_empty() {
            return Err(AsmError::EmptyLabel);
        }
        return Ok(Line::Label(name.to_string()));
    }
    if strip_keyword(&cmd, "org").is_some() {
        return origin(&cmd).map(Line::Origin);
    }
    Ok(Line::Statement(cmd))
}

fn origin(cmd: &str) -> Result<u16, AsmError> {
    let tokens: Vec<&str> = cmd.split_whitespace().collect();
    let [_, value] = tokens.as_slice() else {
        return Err(AsmError::MalformedDirective(format!(
            "`{cmd}`: org takes exactly one address"
        )));
    };
    let value = parse_literal(value)?;
    u16::try_from(value).map_err(|_| AsmError::ValueOutOfRange { value, bits: 16 })
}
