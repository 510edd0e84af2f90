use std::fs;
use std::path::{Path, PathBuf};

use crate::common::types::{DEFAULT_REPLACEMENT, LogLevel};
use crate::error::ConfigError;
use crate::translate::SubstitutionTable;

/// Startup configuration. Built once and never changed while mounted.
#[derive(Debug, Clone)]
pub struct MountConfig {
    pub root: PathBuf,
    pub mountpoint: PathBuf,
    pub substitutions: SubstitutionTable,
    pub allow_other: bool,
    pub unprivileged: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub struct MountConfigBuilder {
    root: PathBuf,
    mountpoint: PathBuf,
    extra_illegal: String,
    replacement: char,
    allow_other: bool,
    unprivileged: bool,
    log_level: LogLevel,
}

impl MountConfig {
    pub fn builder(mountpoint: impl Into<PathBuf>) -> MountConfigBuilder {
        MountConfigBuilder {
            root: PathBuf::from("/"),
            mountpoint: mountpoint.into(),
            extra_illegal: String::new(),
            replacement: DEFAULT_REPLACEMENT,
            allow_other: false,
            unprivileged: true,
            log_level: LogLevel::Warn,
        }
    }
}

impl MountConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn extra_illegal(mut self, chars: impl Into<String>) -> Self {
        self.extra_illegal = chars.into();
        self
    }

    pub fn replacement(mut self, replacement: char) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn allow_other(mut self, allow_other: bool) -> Self {
        self.allow_other = allow_other;
        self
    }

    pub fn unprivileged(mut self, unprivileged: bool) -> Self {
        self.unprivileged = unprivileged;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Result<MountConfig, ConfigError> {
        if !self.root.is_absolute() {
            return Err(ConfigError::RootNotAbsolute(self.root));
        }
        check_dir(&self.root, ConfigError::RootNotDirectory)?;
        check_dir(&self.mountpoint, ConfigError::MountpointNotDirectory)?;
        let substitutions = SubstitutionTable::with_extra(&self.extra_illegal, self.replacement)?;
        Ok(MountConfig {
            root: self.root,
            mountpoint: self.mountpoint,
            substitutions,
            allow_other: self.allow_other,
            unprivileged: self.unprivileged,
            log_level: self.log_level,
        })
    }
}

fn check_dir(path: &Path, not_dir: fn(PathBuf) -> ConfigError) -> Result<(), ConfigError> {
    let meta = fs::metadata(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(not_dir(path.to_path_buf()));
    }
    Ok(())
}
