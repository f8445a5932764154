//! Bridge from the `log` facade to the host application's logger.

use std::sync::{Arc, OnceLock};

/// Logger implemented by the host application.
///
/// Records emitted through the `log` crate are forwarded here once
/// [`set_logger`] has been called.
///
/// ```rust
/// use kvstorage_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Swift
///
/// ```swift
/// final class StorageLogger: KvStorage.Logger {
///     func log(level: KvStorage.LogLevel, message: String) {
///         os_log("%{public}@", message)
///     }
/// }
///
/// KvStorage.setLogger(logger: StorageLogger()) // once, at launch
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Routing decisions and other debugging information.
    Debug,
    /// Informational messages.
    Info,
    /// Failures swallowed by the boolean storage API.
    Warn,
    /// Errors.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

struct ForeignLogger;

impl ForeignLogger {
    // Debug and trace noise from dependencies is dropped; only this crate's
    // own debug output reaches the host.
    fn accepts(record: &log::Record<'_>) -> bool {
        let verbose = matches!(record.level(), log::Level::Debug | log::Level::Trace);
        !verbose
            || record
                .module_path()
                .is_some_and(|module_path| module_path.starts_with("kvstorage_core"))
    }
}

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if !Self::accepts(record) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), record.args().to_string());
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the host logger and routes `log` records to it.
///
/// Only the first call takes effect.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }
    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: log::Level, module: &'static str) -> log::Record<'static> {
        log::Record::builder()
            .level(level)
            .module_path_static(Some(module))
            .build()
    }

    #[test]
    fn test_dependency_debug_records_are_dropped() {
        assert!(!ForeignLogger::accepts(&record(log::Level::Debug, "serde_json::de")));
        assert!(!ForeignLogger::accepts(&record(log::Level::Trace, "ciborium")));
    }

    #[test]
    fn test_own_debug_and_any_warning_pass() {
        assert!(ForeignLogger::accepts(&record(
            log::Level::Debug,
            "kvstorage_core::storage"
        )));
        assert!(ForeignLogger::accepts(&record(log::Level::Warn, "ciborium")));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warn);
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Trace);
    }
}
