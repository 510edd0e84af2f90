use std::ffi::OsString;

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("cannot resolve name collision for {path:?}: suffixes 1..=9 are taken")]
    CollisionExhausted { path: OsString },
    #[error("mapping table inconsistent: backward[{translated:?}] = {found:?}, but path = {expected:?}")]
    Inconsistent {
        translated: OsString,
        expected: OsString,
        found: OsString,
    },
    #[error("{path:?} maps to {translated:?}, which is now a real sibling")]
    ShadowsSibling { path: OsString, translated: OsString },
    #[error("invalid substitution table: {0}")]
    InvalidTable(String),
}

impl MappingError {
    pub fn errno(&self) -> libc::c_int {
        match self {
            MappingError::CollisionExhausted { .. } => libc::ENOSPC,
            MappingError::Inconsistent { .. } => libc::EIO,
            MappingError::ShadowsSibling { .. } => libc::EEXIST,
            MappingError::InvalidTable(_) => libc::EINVAL,
        }
    }
}

impl From<MappingError> for fuse3::Errno {
    fn from(err: MappingError) -> Self {
        fuse3::Errno::from(err.errno())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("mount root must be an absolute path: {0}")]
    RootNotAbsolute(std::path::PathBuf),
    #[error("mount root is not a directory: {0}")]
    RootNotDirectory(std::path::PathBuf),
    #[error("mount point is not a directory: {0}")]
    MountpointNotDirectory(std::path::PathBuf),
    #[error("cannot access {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Table(#[from] MappingError),
}
