use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use crate::common::types::{DEFAULT_ILLEGAL_CHARS, DEFAULT_REPLACEMENT};
use crate::error::MappingError;

/// Byte-level substitution table for characters that are illegal in target names.
///
/// Only ASCII characters can be registered. An ASCII byte never occurs inside a
/// multi-byte UTF-8 sequence, so substituting bytes keeps any encoding intact.
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    map: [Option<u8>; 128],
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        let mut table = Self { map: [None; 128] };
        for ch in DEFAULT_ILLEGAL_CHARS.chars() {
            table.map[ch as usize] = Some(DEFAULT_REPLACEMENT as u8);
        }
        table
    }
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default table plus `extra`, all mapped to `replacement`.
    pub fn with_extra(extra: &str, replacement: char) -> Result<Self, MappingError> {
        let mut table = Self { map: [None; 128] };
        let replacement = checked_ascii(replacement, "replacement")?;
        for ch in DEFAULT_ILLEGAL_CHARS.chars().chain(extra.chars()) {
            let byte = checked_ascii(ch, "illegal character")?;
            table.map[byte as usize] = Some(replacement);
        }
        if table.map[replacement as usize].is_some() {
            return Err(MappingError::InvalidTable(format!(
                "replacement {:?} is itself an illegal character",
                replacement as char
            )));
        }
        Ok(table)
    }

    pub fn substitute_byte(&self, byte: u8) -> Option<u8> {
        self.map.get(byte as usize).copied().flatten()
    }

    pub fn contains_illegal(&self, path: &OsStr) -> bool {
        path.as_bytes()
            .iter()
            .any(|b| self.substitute_byte(*b).is_some())
    }

    pub fn substitute(&self, path: &OsStr) -> OsString {
        let bytes: Vec<u8> = path
            .as_bytes()
            .iter()
            .map(|b| self.substitute_byte(*b).unwrap_or(*b))
            .collect();
        OsString::from_vec(bytes)
    }

    pub fn illegal_chars(&self) -> String {
        self.map
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k as u8 as char)
            .collect()
    }
}

fn checked_ascii(ch: char, what: &str) -> Result<u8, MappingError> {
    if !ch.is_ascii() {
        return Err(MappingError::InvalidTable(format!(
            "{what} {ch:?} is not ASCII"
        )));
    }
    if ch == '/' || ch == '\0' {
        return Err(MappingError::InvalidTable(format!(
            "{what} {ch:?} cannot appear in a file name"
        )));
    }
    Ok(ch as u8)
}
