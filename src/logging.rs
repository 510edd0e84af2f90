use crate::common::types::{LogLevel, LogRecord};

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

pub type LogCallback = fn(record: &LogRecord);

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("another logger is already installed")]
pub struct ExternalLogger;

const MODE_DISABLED: u8 = 0;
const MODE_STDERR: u8 = 1;
const MODE_CALLBACK: u8 = 2;

pub struct FatmirrorLogger {
    mode: AtomicU8,
    level: AtomicU8,
    callback: Mutex<Option<LogCallback>>,
}

impl FatmirrorLogger {
    const fn new() -> Self {
        Self {
            mode: AtomicU8::new(MODE_DISABLED),
            level: AtomicU8::new(LogLevel::Off as u8),
            callback: Mutex::new(None),
        }
    }

    fn level(&self) -> Option<Level> {
        level_from_u8(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
        log::set_max_level(level_filter(level));
    }

    fn set_mode(&self, mode: u8) {
        self.mode.store(mode, Ordering::Relaxed);
    }

    fn set_callback(&self, callback: Option<LogCallback>) {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = callback;
        }
    }
}

impl Log for FatmirrorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let Some(level) = self.level() else {
            return false;
        };
        metadata.level() <= level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        match self.mode.load(Ordering::Relaxed) {
            MODE_STDERR => {
                eprintln!("[fatmirror][{}] {}", record.level(), record.args());
            }
            MODE_CALLBACK => {
                let Ok(slot) = self.callback.lock() else {
                    return;
                };
                let Some(callback) = *slot else {
                    return;
                };
                let record = LogRecord {
                    level: log_level_from(record.level()),
                    target: record.target().to_string(),
                    message: record.args().to_string(),
                    file: record.file().unwrap_or("").to_string(),
                    line: record.line().unwrap_or(0),
                };
                callback(&record);
            }
            _ => {}
        }
    }

    fn flush(&self) {}
}

static LOGGER: FatmirrorLogger = FatmirrorLogger::new();
static LOGGER_STATE: OnceLock<LoggerInstall> = OnceLock::new();

#[derive(Copy, Clone)]
enum LoggerInstall {
    Installed,
    External,
}

fn init_logger() -> LoggerInstall {
    *LOGGER_STATE.get_or_init(|| match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(LevelFilter::Off);
            LoggerInstall::Installed
        }
        Err(_) => LoggerInstall::External,
    })
}

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::Off,
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

fn level_from_u8(level: u8) -> Option<Level> {
    match level {
        x if x == LogLevel::Error as u8 => Some(Level::Error),
        x if x == LogLevel::Warn as u8 => Some(Level::Warn),
        x if x == LogLevel::Info as u8 => Some(Level::Info),
        x if x == LogLevel::Debug as u8 => Some(Level::Debug),
        x if x == LogLevel::Trace as u8 => Some(Level::Trace),
        _ => None,
    }
}

fn log_level_from(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::Error,
        Level::Warn => LogLevel::Warn,
        Level::Info => LogLevel::Info,
        Level::Debug => LogLevel::Debug,
        Level::Trace => LogLevel::Trace,
    }
}

pub fn log_set_stderr(level: LogLevel) -> Result<(), ExternalLogger> {
    if matches!(init_logger(), LoggerInstall::External) {
        return Err(ExternalLogger);
    }
    LOGGER.set_mode(MODE_STDERR);
    LOGGER.set_level(level);
    Ok(())
}

pub fn log_set_callback(callback: Option<LogCallback>, level: LogLevel) -> Result<(), ExternalLogger> {
    if callback.is_none() {
        log_disable();
        return Ok(());
    }
    if matches!(init_logger(), LoggerInstall::External) {
        return Err(ExternalLogger);
    }
    LOGGER.set_callback(callback);
    LOGGER.set_mode(MODE_CALLBACK);
    LOGGER.set_level(level);
    Ok(())
}

pub fn log_set_level(level: LogLevel) {
    match init_logger() {
        LoggerInstall::Installed => LOGGER.set_level(level),
        LoggerInstall::External => log::set_max_level(level_filter(level)),
    }
}

pub fn log_disable() {
    match init_logger() {
        LoggerInstall::Installed => {
            LOGGER.set_mode(MODE_DISABLED);
            LOGGER.set_level(LogLevel::Off);
        }
        LoggerInstall::External => log::set_max_level(LevelFilter::Off),
    }
}
