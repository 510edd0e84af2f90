use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::sync::Mutex;

use log::warn;

use crate::error::MappingError;
use crate::translate::parser::{basename, join, normalize};
use crate::translate::{PathResolver, PathTranslator, SubstitutionTable};

/// Outcome of translating one entry of a directory listing.
#[derive(Debug)]
pub struct TranslatedEntry {
    pub original: OsString,
    pub result: Result<OsString, MappingError>,
}

pub trait PathMapper: Send + Sync {
    fn translate(&self, original: &OsStr) -> Result<OsString, MappingError>;

    fn resolve_original(&self, translated: &OsStr) -> OsString;

    /// Translate every entry of `dir` in sorted original-name order.
    ///
    /// Returned entries carry the translated basename. Names that need no
    /// translation are never handed out to a translated sibling.
    fn translate_dir_entries(&self, dir: &OsStr, names: Vec<OsString>) -> Vec<TranslatedEntry>;
}

/// The process-wide mapping, behind a single lock.
///
/// Check-then-insert in the translator is order dependent, so one lock covers
/// both tables and is held for a whole directory enumeration.
#[derive(Debug, Default)]
pub struct SharedMapper {
    inner: Mutex<PathTranslator>,
}

impl SharedMapper {
    pub fn new(substitutions: SubstitutionTable) -> Self {
        Self {
            inner: Mutex::new(PathTranslator::new(substitutions)),
        }
    }
}

impl PathMapper for SharedMapper {
    fn translate(&self, original: &OsStr) -> Result<OsString, MappingError> {
        let mut guard = self.inner.lock().expect("mapping lock poisoned");
        guard.translate(original)
    }

    fn resolve_original(&self, translated: &OsStr) -> OsString {
        let guard = self.inner.lock().expect("mapping lock poisoned");
        PathResolver::new(guard.tables()).resolve_original(translated)
    }

    fn translate_dir_entries(&self, dir: &OsStr, mut names: Vec<OsString>) -> Vec<TranslatedEntry> {
        names.sort();
        let dir = normalize(dir);
        let mut guard = self.inner.lock().expect("mapping lock poisoned");

        let plain: HashSet<OsString> = names
            .iter()
            .filter(|name| !guard.substitutions().contains_illegal(name))
            .map(|name| join(&dir, name))
            .collect();

        names
            .into_iter()
            .map(|name| {
                let full = join(&dir, &name);
                let result = guard
                    .translate_with_reserved(&full, |candidate| plain.contains(candidate))
                    .map(|translated| basename(&translated).to_os_string());
                if let Err(err) = &result {
                    warn!("hiding {:?} in {:?}: {}", name, dir, err);
                }
                TranslatedEntry {
                    original: name,
                    result,
                }
            })
            .collect()
    }
}
