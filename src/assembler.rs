use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::buffer::CodeBuffer;
use crate::encoder::{Encoder, TableEncoder};
use crate::error::{AsmError, Error};
use crate::isa::z80;
use crate::operand::Statement;
use crate::preprocess::{Line, Preprocessor};
use crate::symbols::{Patches, PatchRequest, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmConfig {
    /// Used when the source never sets `org`.
    pub origin: Option<u16>,
    pub allow_label_redefinition: bool,
}

impl Default for AsmConfig {
    fn default() -> Self {
        Self {
            origin: None,
            allow_label_redefinition: true,
        }
    }
}

/// One emitted statement, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub line: usize,
    pub ip: usize,
    pub len: usize,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assembly {
    pub code: Vec<u8>,
    pub origin: Option<u16>,
    pub symbols: BTreeMap<String, usize>,
    pub listing: Vec<ListingEntry>,
}

impl Assembly {
    pub fn bytes_of(&self, entry: &ListingEntry) -> &[u8] {
        self.code.get(entry.ip..entry.ip + entry.len).unwrap_or(&[])
    }

    /// Load address of `ip`; without an origin this is the ip itself.
    pub fn address_of(&self, ip: usize) -> u32 {
        u32::from(self.origin.unwrap_or(0)) + ip as u32
    }
}

/// Two-phase driver: [`Assembler::push_line`] collects code and pending
/// label references, [`Assembler::finish`] patches them in.
pub struct Assembler<E: Encoder> {
    encoder: E,
    config: AsmConfig,
    pre: Preprocessor,
    symbols: SymbolTable,
    patches: Patches,
    code: CodeBuffer,
    origin: Option<u16>,
    listing: Vec<ListingEntry>,
    line: usize,
}

impl Assembler<TableEncoder<'static>> {
    pub fn z80(config: AsmConfig) -> Self {
        Self::new(z80::encoder(), config)
    }
}

impl<E: Encoder> Assembler<E> {
    pub fn new(encoder: E, config: AsmConfig) -> Self {
        Self {
            encoder,
            config,
            pre: Preprocessor::new(),
            symbols: SymbolTable::default(),
            patches: Patches::default(),
            code: CodeBuffer::new(),
            origin: None,
            listing: Vec::new(),
            line: 0,
        }
    }

    pub fn assemble(mut self, source: &str) -> Result<Assembly, Error> {
        for raw in source.lines() {
            self.push_line(raw)?;
        }
        self.finish()
    }

    pub fn ip(&self) -> usize {
        self.code.ip()
    }

    pub fn push_line(&mut self, raw: &str) -> Result<(), Error> {
        self.line += 1;
        let line = self.line;
        self.step(raw).map_err(|kind| Error::Line { line, kind })
    }

    fn step(&mut self, raw: &str) -> Result<(), AsmError> {
        match self.pre.process(raw)? {
            Line::Blank | Line::Variable { .. } => {}
            Line::Origin(org) => {
                debug!(line = self.line, org, "origin");
                self.origin = Some(org);
            }
            Line::Label(name) => self.declare(&name)?,
            Line::Statement(text) => self.emit(&text)?,
        }
        Ok(())
    }

    fn declare(&mut self, name: &str) -> Result<(), AsmError> {
        let ip = self.code.ip();
        if !self.config.allow_label_redefinition && self.symbols.get(name).is_some() {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        if let Some(prev) = self.symbols.declare(name, ip) {
            warn!(line = self.line, label = name, prev, ip, "label redeclared");
        }
        debug!(line = self.line, label = name, ip, "label");
        Ok(())
    }

    fn emit(&mut self, text: &str) -> Result<(), AsmError> {
        let stmt = Statement::parse(text, self.encoder.vocabulary())?;
        let encoded = self.encoder.encode(&stmt)?;
        let site = self.code.emit(&encoded.bytes);
        trace!(line = self.line, ip = site, bytes = ?encoded.bytes, "{}", stmt.text);
        if let Some(fixup) = encoded.fixup {
            self.patches.record(PatchRequest {
                label: fixup.label,
                site,
                kind: fixup.kind,
            });
        }
        self.listing.push(ListingEntry {
            line: self.line,
            ip: site,
            len: encoded.bytes.len(),
            source: stmt.text,
        });
        Ok(())
    }

    pub fn finish(self) -> Result<Assembly, Error> {
        let Assembler {
            config,
            symbols,
            patches,
            mut code,
            origin,
            listing,
            ..
        } = self;
        let origin = origin.or(config.origin);
        let patched = patches
            .resolve(&symbols, origin, &mut code)
            .map_err(Error::Resolve)?;
        info!(
            bytes = code.ip(),
            labels = symbols.len(),
            patched,
            "assembly finished"
        );
        Ok(Assembly {
            code: code.into_bytes(),
            origin,
            symbols: symbols.sorted(),
            listing,
        })
    }
}

/// Assemble `source` with the Z80 table and default settings.
pub fn assemble(source: &str) -> Result<Assembly, Error> {
    Assembler::z80(AsmConfig::default()).assemble(source)
}
