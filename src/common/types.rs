#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, clap::ValueEnum)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

#[derive(Clone, Debug)]
pub struct LogRecord {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    pub file: String,
    pub line: u32,
}

/// Characters FAT-style filesystems refuse in names, and what they become.
pub const DEFAULT_ILLEGAL_CHARS: &str = "?*:";
pub const DEFAULT_REPLACEMENT: char = '_';

/// Highest numeric suffix tried when disambiguating a collision.
pub const MAX_COLLISION_SUFFIX: u32 = 9;
