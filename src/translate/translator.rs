use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use log::{error, info, trace, warn};

use crate::common::types::MAX_COLLISION_SUFFIX;
use crate::error::MappingError;
use crate::translate::parser::split_extension;
use crate::translate::substitute::SubstitutionTable;
use crate::translate::tables::MappingTables;

/// Creates and caches safe names for paths containing illegal characters.
#[derive(Debug, Default)]
pub struct PathTranslator {
    substitutions: SubstitutionTable,
    tables: MappingTables,
}

impl PathTranslator {
    pub fn new(substitutions: SubstitutionTable) -> Self {
        Self {
            substitutions,
            tables: MappingTables::new(),
        }
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    pub fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    pub fn translate(&mut self, original: &OsStr) -> Result<OsString, MappingError> {
        self.translate_with_reserved(original, |_| false)
    }

    /// Like [`translate`](Self::translate), but never hands out a name for which
    /// `reserved` returns true. Directory listings use this to keep translated
    /// names from shadowing real siblings whose names need no translation.
    pub fn translate_with_reserved<F>(
        &mut self,
        original: &OsStr,
        reserved: F,
    ) -> Result<OsString, MappingError>
    where
        F: Fn(&OsStr) -> bool,
    {
        if !self.substitutions.contains_illegal(original) {
            return Ok(original.to_os_string());
        }
        if let Some(known) = self.tables.forward(original) {
            let known = known.to_os_string();
            if self.tables.is_shadowed(&known) || reserved(&known) {
                return Err(self.yield_to_sibling(original, known));
            }
            trace!("mapping hit: {:?} -> {:?}", original, known);
            return Ok(known);
        }

        let candidate = self.substitutions.substitute(original);
        if self.is_free(&candidate, original, &reserved)? {
            info!("new mapping: {:?} -> {:?}", original, candidate);
            self.tables.register(original.to_os_string(), candidate.clone());
            return Ok(candidate);
        }

        let (stem, ext) = split_extension(&candidate);
        for suffix in 1..=MAX_COLLISION_SUFFIX {
            let numbered = with_suffix(stem, suffix, ext);
            if self.is_free(&numbered, original, &reserved)? {
                info!(
                    "new mapping (collision {}): {:?} -> {:?}",
                    suffix, original, numbered
                );
                self.tables.register(original.to_os_string(), numbered.clone());
                return Ok(numbered);
            }
        }

        error!("cannot resolve collision for {:?}", original);
        Err(MappingError::CollisionExhausted {
            path: original.to_os_string(),
        })
    }

    // An earlier mapping whose name is now taken by a real entry keeps its pair,
    // but the name resolves to the real entry from here on.
    fn yield_to_sibling(&mut self, original: &OsStr, translated: OsString) -> MappingError {
        if !self.tables.is_shadowed(&translated) {
            warn!(
                "{:?} appeared on disk; {:?} is no longer reachable through it",
                translated, original
            );
            self.tables.shadow(&translated);
        }
        MappingError::ShadowsSibling {
            path: original.to_os_string(),
            translated,
        }
    }

    // A name already mapped back to `original` means the forward table lost an entry.
    fn is_free<F>(&self, name: &OsStr, original: &OsStr, reserved: &F) -> Result<bool, MappingError>
    where
        F: Fn(&OsStr) -> bool,
    {
        match self.tables.backward(name) {
            Some(found) if found == original => Err(inconsistent(name, original, found)),
            Some(_) => Ok(false),
            None => Ok(!reserved(name)),
        }
    }
}

#[cfg(test)]
impl PathTranslator {
    pub(crate) fn tables_mut(&mut self) -> &mut MappingTables {
        &mut self.tables
    }
}

fn with_suffix(stem: &OsStr, suffix: u32, ext: &OsStr) -> OsString {
    let mut out = stem.as_bytes().to_vec();
    out.extend_from_slice(suffix.to_string().as_bytes());
    out.extend_from_slice(ext.as_bytes());
    OsString::from_vec(out)
}

fn inconsistent(translated: &OsStr, expected: &OsStr, found: &OsStr) -> MappingError {
    error!(
        "mapping table inconsistent: backward[{:?}] = {:?}, but path = {:?}",
        translated, found, expected
    );
    MappingError::Inconsistent {
        translated: translated.to_os_string(),
        expected: expected.to_os_string(),
        found: found.to_os_string(),
    }
}
