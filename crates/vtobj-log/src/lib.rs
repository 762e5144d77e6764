//! A minimal, zero-dependency logging crate for the `vtobj` runtime.
//!
//! This crate provides thread-safe levelled logging with automatic module path
//! detection and coloured level tags. Output goes to stderr so it never mixes
//! with what the runtime prints on behalf of objects.
//!
//! # Example
//!
//! ```
//! use vtobj_log::{debug, error, info, warn, Level};
//!
//! // Set the minimum log level
//! vtobj_log::set_level(Level::Debug);
//!
//! let live = 3;
//! info!("{} objects alive", live);
//! debug!("Free slots: {:?}", vec![1, 2]);
//! warn!("Unused construction argument");
//! error!("Stale handle");
//! ```
//!
//! # Environment
//!
//! [`init_from_env`] reads the level from `VTOBJ_LOG` (`error`, `warn`, `info`,
//! `debug`, `trace`). Colours are disabled when `NO_COLOR` is set.

use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Environment variable consulted by [`init_from_env`].
pub const LEVEL_ENV: &str = "VTOBJ_LOG";

/// Log levels representing the severity of log messages.
///
/// Lower numeric values indicate higher severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Failures the caller is about to see as an error.
    Error = 0,
    /// Suspicious but recoverable situations.
    Warn = 1,
    /// Informational messages.
    Info = 2,
    /// Class definitions, storage growth.
    Debug = 3,
    /// Every allocation, deletion and pool drain.
    Trace = 4,
}

impl Level {
    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the upper-case tag for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no log level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case.
    ///
    /// ```
    /// use vtobj_log::Level;
    ///
    /// assert_eq!("error".parse(), Ok(Level::Error));
    /// assert_eq!("INFO".parse(), Ok(Level::Info));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// The global logger.
///
/// Level and colour settings live in atomics so the logger can be shared by
/// every thread without locking.
pub struct Logger {
    level: AtomicU8,
    color: AtomicBool,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            color: AtomicBool::new(true),
        }
    }

    /// Sets the minimum level; messages below it are dropped.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Checks if a message at the given level would be logged.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    /// Turns ANSI colours on or off.
    pub fn set_color(&self, on: bool) {
        self.color.store(on, Ordering::Relaxed);
    }

    fn color(&self) -> bool {
        self.color.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, initialising it at `Level::Info` on first use.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Info))
}

/// Sets the minimum level of the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the minimum level of the global logger from a level name.
///
/// # Errors
///
/// Returns [`ParseLevelError`] if `s` names no level; the level is unchanged.
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Configures the global logger from the environment.
///
/// Reads [`LEVEL_ENV`] for the level and `NO_COLOR` for colour output. An
/// unset or unparsable level leaves the current level in place and returns it.
pub fn init_from_env() -> Level {
    let logger = get_logger();
    if let Some(level) = std::env::var(LEVEL_ENV).ok().and_then(|v| v.parse().ok()) {
        logger.set_level(level);
    }
    if std::env::var_os("NO_COLOR").is_some() {
        logger.set_color(false);
    }
    logger.level()
}

fn render(level: Level, target: &str, args: Arguments, color: bool) -> String {
    const RESET: &str = "\x1b[0m";

    if color {
        format!("{}[{}]{RESET} {target}: {args}", level.color_code(), level.as_str())
    } else {
        format!("[{}] {target}: {args}", level.as_str())
    }
}

/// Writes one record. Called by the macros after the level check.
#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    let logger = get_logger();
    if !logger.enabled(level) {
        return;
    }

    eprintln!("{}", render(level, target, args, logger.color()));
}

/// Logs a message at an explicit level, tagged with the caller's module path.
///
/// ```
/// use vtobj_log::{log, Level};
///
/// log!(level: Level::Info, "derived {} classes", 4);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            if $crate::get_logger().enabled($level) {
                $crate::__log_with_target(
                    $level,
                    module_path!(),
                    format_args!($($arg)*)
                );
            }
        }
    };
}

/// Logs a message at the Error level.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs a message at the Warn level.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs a message at the Info level.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs a message at the Debug level.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs a message at the Trace level.
///
/// ```
/// use vtobj_log::trace;
///
/// # let slot = 7;
/// trace!("released slot {}", slot);
/// ```
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
