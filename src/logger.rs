//! Structured logging implementation
//!
//! Records are formatted and handed to the sink registered with [init], usually the platform
//! console. Records emitted before [init] are dropped.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{Level, LevelFilter, Metadata, Record};
use spin::Once;

use crate::config;

/// Where formatted records are written.
pub type LogSink = fn(fmt::Arguments);

static SINK: Once<LogSink> = Once::new();

// ————————————————————————————————— Logger ————————————————————————————————— //

pub struct Logger {}

impl Logger {
    const GLOBAL_LOG_LEVEL: LevelFilter = match config::LOG_LEVEL {
        Some(s) => match s.as_bytes() {
            b"trace" => LevelFilter::Trace,
            b"debug" => LevelFilter::Debug,
            b"info" => LevelFilter::Info,
            b"warn" => LevelFilter::Warn,
            b"error" => LevelFilter::Error,
            b"off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        },
        _ => LevelFilter::Info,
    };

    fn contains_target(log_modules: &[&str], target: &str) -> bool {
        log_modules.iter().any(|module| *module == target)
    }

    fn filter_by_module(&self, record: &Record) -> bool {
        let level = record.metadata().level();
        let target = record.target();

        (level <= LevelFilter::Trace && Self::contains_target(config::LOG_TRACE, target))
            || (level <= LevelFilter::Debug && Self::contains_target(config::LOG_DEBUG, target))
            || (level <= LevelFilter::Info && Self::contains_target(config::LOG_INFO, target))
            || (level <= LevelFilter::Warn && Self::contains_target(config::LOG_WARN, target))
            || (level <= LevelFilter::Error && Self::contains_target(config::LOG_ERROR, target))
    }

    fn filter_by_global_level(&self, record: &Record) -> bool {
        Self::GLOBAL_LOG_LEVEL >= record.metadata().level()
    }
}

impl log::Log for Logger {
    fn enabled(&self, _: &Metadata) -> bool {
        // Filtering happens in `log`, where the target is known
        true
    }

    fn log(&self, record: &Record) {
        if !(self.filter_by_global_level(record) || self.filter_by_module(record)) {
            return;
        }

        if let Some(sink) = SINK.get() {
            sink(format_args!(
                "[{} | {}] {}\n",
                level_display(record.level()),
                record.target(),
                record.args()
            ))
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger {};

/// Installs the logger, writing records to `sink`.
///
/// Only the first call has an effect.
pub fn init(sink: LogSink) {
    static IS_INITIALIZED: AtomicBool = AtomicBool::new(false);

    match IS_INITIALIZED.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst) {
        Ok(_) => {
            SINK.call_once(|| sink);
            if log::set_logger(&LOGGER).is_err() {
                sink(format_args!("Another logger is already installed\n"));
                return;
            }
            log::set_max_level(LevelFilter::Trace);
        }
        Err(_) => {
            log::warn!("Logger is already initialized, skipping init");
        }
    };
}

// ————————————————————————————————— Utils —————————————————————————————————— //

fn level_display(level: Level) -> &'static str {
    if config::LOG_COLOR {
        // We log with colors, using ANSI escape sequences
        match level {
            Level::Error => "\x1b[31;1mError\x1b[0m",
            Level::Warn => "\x1b[33;1mWarn\x1b[0m ",
            Level::Info => "\x1b[32;1mInfo\x1b[0m ",
            Level::Debug => "\x1b[34;1mDebug\x1b[0m",
            Level::Trace => "\x1b[35;1mTrace\x1b[0m",
        }
    } else {
        match level {
            Level::Error => "Error",
            Level::Warn => "Warn ",
            Level::Info => "Info ",
            Level::Debug => "Debug",
            Level::Trace => "Trace",
        }
    }
}
