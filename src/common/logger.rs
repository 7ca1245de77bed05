//! logging setup
//! stdout logger driven by the configured log level, plus tagged log macros

use log::SetLoggerError;
use pretty_env_logger;
use super::setting::Settings;

/// init logger with the level from settings
pub fn init_logger() -> Result<(), SetLoggerError> {
    init_logger_with_level(Settings::get().env.log_level.as_str())
}

/// init logger with an explicit level, repeated calls are ignored
pub fn init_logger_with_level(level: &str) -> Result<(), SetLoggerError> {
    if log::max_level() != log::LevelFilter::Off {
        log::warn!("logger is already initialized");
        return Ok(())
    }

    pretty_env_logger::formatted_builder()
        .target(pretty_env_logger::env_logger::Target::Stdout)
        .filter_level(parse_level(level))
        .try_init()?;
    log::info!("logger initialized, level: {}", level);
    Ok(())
}

fn parse_level(level: &str) -> log::LevelFilter {
    match level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info
    }
}


/// log with a TAG prefix, supports trace debug info warn error
#[macro_export]
macro_rules! warn {
    ($tag:expr, $($arg:tt)*) => ({
        log::warn!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! error {
    ($tag:expr, $($arg:tt)*) => ({
        log::error!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! info {
    ($tag:expr, $($arg:tt)*) => ({
        log::info!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! debug {
    ($tag:expr, $($arg:tt)*) => ({
        log::debug!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! trace {
    ($tag:expr, $($arg:tt)*) => ({
        log::trace!("[{}] {}", $tag, format_args!($($arg)*));
    })
}
