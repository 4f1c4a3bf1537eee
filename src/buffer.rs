use crate::error::AsmError;

/// Growable output image. The instruction pointer is always the current
/// length; bytes already emitted are only ever changed through the patch
/// methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ip(&self) -> usize {
        self.bytes.len()
    }

    /// Append `bytes`, returning the ip they start at.
    pub fn emit(&mut self, bytes: &[u8]) -> usize {
        let site = self.ip();
        self.bytes.extend_from_slice(bytes);
        site
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn patch_u8(&mut self, at: usize, val: u8) -> Result<(), AsmError> {
        let len = self.bytes.len();
        let slot = self.bytes.get_mut(at).ok_or(AsmError::PatchOutOfBounds { at, len })?;
        *slot = val;
        Ok(())
    }

    pub fn patch_u16_le(&mut self, at: usize, val: u16) -> Result<(), AsmError> {
        let len = self.bytes.len();
        let slot = self
            .bytes
            .get_mut(at..at.saturating_add(2))
            .ok_or(AsmError::PatchOutOfBounds { at, len })?;
        slot.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}
