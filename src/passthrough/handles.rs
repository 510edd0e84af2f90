use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// A file opened on behalf of a client, pinned to the on-disk path resolved at open time.
#[derive(Debug)]
pub struct OpenFile {
    pub file: File,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct HandleTable {
    next: AtomicU64,
    files: RwLock<HashMap<u64, Arc<OpenFile>>>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self {
            // 0 is what stateless opendir hands out.
            next: AtomicU64::new(1),
            files: RwLock::new(HashMap::new()),
        }
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, file: OpenFile) -> u64 {
        let fh = self.next.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.write().expect("handle table lock poisoned");
        files.insert(fh, Arc::new(file));
        fh
    }

    pub fn get(&self, fh: u64) -> Option<Arc<OpenFile>> {
        let files = self.files.read().expect("handle table lock poisoned");
        files.get(&fh).cloned()
    }

    /// Forget `fh`. The descriptor closes once in-flight users drop their clones.
    pub fn remove(&self, fh: u64) -> Option<Arc<OpenFile>> {
        let mut files = self.files.write().expect("handle table lock poisoned");
        files.remove(&fh)
    }

    pub fn len(&self) -> usize {
        self.files.read().expect("handle table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
