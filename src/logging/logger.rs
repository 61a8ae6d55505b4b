use std::sync::{
    atomic::{AtomicI32, Ordering},
    OnceLock, RwLock,
};

use log::{LevelFilter, Metadata, Record};

use crate::{
    ffi::{
        btck_LogLevel, BTCK_LOG_LEVEL_DEBUG, BTCK_LOG_LEVEL_ERROR, BTCK_LOG_LEVEL_INFO,
        BTCK_LOG_LEVEL_TRACE, BTCK_LOG_LEVEL_WARNING,
    },
    KernelError,
};

/// A function for handling log messages produced by this library.
pub trait Log: Send + Sync {
    fn log(&self, message: &str);
}

impl<F: Fn(&str) + Send + Sync> Log for F {
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Logging levels for controlling message verbosity.
///
/// Determines the minimum severity level of messages that will be logged.
/// Higher levels include all messages from lower levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum LogLevel {
    /// Detailed trace information for debugging
    Trace = BTCK_LOG_LEVEL_TRACE,
    /// Debug information for development
    Debug = BTCK_LOG_LEVEL_DEBUG,
    /// General informational messages
    Info = BTCK_LOG_LEVEL_INFO,
    /// Recoverable problems
    Warning = BTCK_LOG_LEVEL_WARNING,
    /// Failures
    Error = BTCK_LOG_LEVEL_ERROR,
}

impl From<LogLevel> for btck_LogLevel {
    fn from(level: LogLevel) -> Self {
        level as btck_LogLevel
    }
}

impl TryFrom<btck_LogLevel> for LogLevel {
    type Error = KernelError;

    fn try_from(value: btck_LogLevel) -> Result<Self, KernelError> {
        match value {
            BTCK_LOG_LEVEL_TRACE => Ok(LogLevel::Trace),
            BTCK_LOG_LEVEL_DEBUG => Ok(LogLevel::Debug),
            BTCK_LOG_LEVEL_INFO => Ok(LogLevel::Info),
            BTCK_LOG_LEVEL_WARNING => Ok(LogLevel::Warning),
            BTCK_LOG_LEVEL_ERROR => Ok(LogLevel::Error),
            _ => Err(KernelError::InvalidArgument(format!(
                "unknown log level {}",
                value
            ))),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => LogLevel::Trace,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Error => LogLevel::Error,
        }
    }
}

/// Forwards records from the `log` facade to a user-defined [`Log`] sink.
///
/// One instance is installed process-wide by [`set_logger`]; the sink and
/// level can be swapped at any time afterwards.
pub struct Logger {
    sink: RwLock<Option<Box<dyn Log>>>,
    level: AtomicI32,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub const fn new() -> Logger {
        Logger {
            sink: RwLock::new(None),
            level: AtomicI32::new(BTCK_LOG_LEVEL_INFO),
        }
    }

    /// Replaces the sink, returning the previous one.
    pub fn set_sink(&self, sink: Option<Box<dyn Log>>) -> Option<Box<dyn Log>> {
        match self.sink.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, sink),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), sink),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.into(), Ordering::Relaxed);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::try_from(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Info)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        LogLevel::from(metadata.level()) >= self.level()
    }

    fn log(&self, record: &Record) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }
        let Ok(guard) = self.sink.read() else {
            return;
        };
        if let Some(sink) = guard.as_ref() {
            let message = format!(
                "[{}] {}: {}\n",
                record.level(),
                record.target(),
                record.args()
            );
            sink.log(&message);
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger::new();
static INSTALLED: OnceLock<bool> = OnceLock::new();

fn install() -> Result<(), KernelError> {
    let installed = *INSTALLED.get_or_init(|| log::set_logger(&LOGGER).is_ok());
    if installed {
        Ok(())
    } else {
        Err(KernelError::Internal(
            "Another logger is already installed.".to_string(),
        ))
    }
}

/// Routes this library's log records to `log` for messages at `level` or
/// above. Replaces any sink set by an earlier call.
///
/// # Errors
///
/// Returns [`KernelError::Internal`] if a different `log` implementation
/// was installed first.
pub fn set_logger<T: Log + 'static>(log: T, level: LogLevel) -> Result<(), KernelError> {
    install()?;
    LOGGER.set_level(level);
    LOGGER.set_sink(Some(Box::new(log)));
    log::set_max_level(level.into());
    Ok(())
}

/// Changes the level of the installed logger.
pub fn set_log_level(level: LogLevel) -> Result<(), KernelError> {
    install()?;
    LOGGER.set_level(level);
    log::set_max_level(level.into());
    Ok(())
}

/// Drops the current sink and stops formatting records.
pub fn disable_logging() {
    LOGGER.set_sink(None);
    if INSTALLED.get().copied().unwrap_or(false) {
        log::set_max_level(LevelFilter::Off);
    }
}
