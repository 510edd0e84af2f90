mod common;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod passthrough;
pub mod translate;

#[cfg(not(target_os = "linux"))]
compile_error!("fatmirror only supports Linux targets.");

pub use crate::common::types::*;
pub use crate::config::MountConfig;
pub use crate::error::{ConfigError, MappingError};
pub use crate::mapper::{PathMapper, SharedMapper, TranslatedEntry};
pub use crate::passthrough::Passthrough;
pub use crate::translate::{MappingTables, PathResolver, PathTranslator, SubstitutionTable};
