use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};

/// Forward (original -> translated) and backward (translated -> original) tables.
///
/// Entries are only ever added in pairs, so `forward[o] == t` iff `backward[t] == o`.
/// Nothing is ever removed; the tables live as long as the mount.
///
/// A translated name that later turns up as a real on-disk sibling is marked
/// shadowed: the pair stays registered, but resolution hands the name to the
/// real entry.
#[derive(Debug, Default)]
pub struct MappingTables {
    forward: HashMap<OsString, OsString>,
    backward: HashMap<OsString, OsString>,
    shadowed: HashSet<OsString>,
}

impl MappingTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&self, original: &OsStr) -> Option<&OsStr> {
        self.forward.get(original).map(OsString::as_os_str)
    }

    pub fn backward(&self, translated: &OsStr) -> Option<&OsStr> {
        self.backward.get(translated).map(OsString::as_os_str)
    }

    /// Original behind `translated`, unless a real sibling owns that name.
    pub fn original_of(&self, translated: &OsStr) -> Option<&OsStr> {
        if self.shadowed.contains(translated) {
            return None;
        }
        self.backward(translated)
    }

    pub fn is_shadowed(&self, translated: &OsStr) -> bool {
        self.shadowed.contains(translated)
    }

    pub(crate) fn shadow(&mut self, translated: &OsStr) {
        debug_assert!(self.backward.contains_key(translated));
        self.shadowed.insert(translated.to_os_string());
    }

    pub(crate) fn register(&mut self, original: OsString, translated: OsString) {
        debug_assert!(!self.forward.contains_key(&original));
        debug_assert!(!self.backward.contains_key(&translated));
        self.backward.insert(translated.clone(), original.clone());
        self.forward.insert(original, translated);
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Registered `(original, translated)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.forward
            .iter()
            .map(|(o, t)| (o.as_os_str(), t.as_os_str()))
    }

    /// True when every entry in either table has its exact inverse in the other.
    pub fn is_bijective(&self) -> bool {
        self.forward.len() == self.backward.len()
            && self
                .forward
                .iter()
                .all(|(o, t)| self.backward.get(t) == Some(o))
            && self
                .backward
                .iter()
                .all(|(t, o)| self.forward.get(o) == Some(t))
    }
}

#[cfg(test)]
impl MappingTables {
    /// Add a backward entry without its forward twin.
    pub(crate) fn insert_backward_only(&mut self, translated: &str, original: &str) {
        self.backward
            .insert(OsString::from(translated), OsString::from(original));
    }
}
