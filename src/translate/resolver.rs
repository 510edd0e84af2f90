use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::trace;

use crate::translate::parser::{basename, join, parse_path};
use crate::translate::tables::MappingTables;

/// Maps client-visible paths back to the on-disk paths they were produced from.
pub struct PathResolver<'a> {
    tables: &'a MappingTables,
}

impl<'a> PathResolver<'a> {
    pub fn new(tables: &'a MappingTables) -> Self {
        Self { tables }
    }

    /// Resolve `translated` one component at a time, parents first.
    ///
    /// Each prefix is looked up as a whole in the backward table; a hit swaps in
    /// the original basename, a miss (or a shadowed name) keeps the component as is.
    pub fn resolve_original(&self, translated: &OsStr) -> OsString {
        let parsed = parse_path(translated);
        let start = if parsed.absolute { "/" } else { "" };
        let mut translated_prefix = OsString::from(start);
        let mut original = OsString::from(start);
        for component in parsed.components {
            translated_prefix = join(&translated_prefix, component);
            let name = match self.tables.original_of(&translated_prefix) {
                Some(found) => basename(found),
                None => component,
            };
            original = join(&original, name);
        }
        if translated != original.as_os_str() {
            trace!("resolved {:?} -> {:?}", translated, original);
        }
        original
    }

    pub fn to_on_disk_path(&self, root: &Path, client_path: &OsStr) -> PathBuf {
        on_disk_path(root, &self.resolve_original(client_path))
    }
}

/// Place an original (untranslated) path under the mount root.
pub fn on_disk_path(root: &Path, original: &OsStr) -> PathBuf {
    let bytes = original.as_bytes();
    let start = bytes.iter().take_while(|b| **b == b'/').count();
    let relative = OsStr::from_bytes(&bytes[start..]);
    if relative.is_empty() {
        return root.to_path_buf();
    }
    root.join(relative)
}
