use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::time::Instant;

use once_cell::sync::Lazy;
use slog::{Drain, FnValue, Level};
use slog_scope::GlobalLoggerGuard;
use slog_term::ThreadSafeTimestampFn;

/// Env var holding the log level, e.g. `NAV_LOG=trace`
const LEVEL_ENV: &str = "NAV_LOG";

/// Set to anything to disable colours
const NO_COLOR_ENV: &str = "NO_COLOR";

static START: Lazy<Instant> = Lazy::new(Instant::now);

pub struct LoggerBuilder {
    level: Level,
    color: bool,
}

/// Keeps the global logger installed until dropped
pub struct Logger(Level, GlobalLoggerGuard);

#[derive(Debug)]
pub enum LogError {
    BadLevel(String),
}

impl LoggerBuilder {
    pub fn with_env() -> Result<Self, LogError> {
        let mut builder = Self::default();

        if let Ok(env) = std::env::var(LEVEL_ENV) {
            let level = env.parse().map_err(|_| LogError::BadLevel(env.clone()))?;
            builder = builder.level(level)
        }

        if std::env::var_os(NO_COLOR_ENV).is_some() {
            builder = builder.color(false);
        }

        Ok(builder)
    }

    pub fn level(mut self, s: Level) -> Self {
        self.level = s;
        self
    }

    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Timestamps are seconds since the first log line
    pub fn init_with_uptime(self) -> Result<Logger, LogError> {
        Lazy::force(&START);
        self.init(uptime)
    }

    /// Every record is tagged with the name of the thread that logged it
    pub fn init(self, timestamp_fn: impl ThreadSafeTimestampFn) -> Result<Logger, LogError> {
        let decorator = slog_term::TermDecorator::new().stderr();
        let decorator = if self.color {
            decorator.force_color()
        } else {
            decorator.force_plain()
        };

        let drain = slog_term::CompactFormat::new(decorator.build())
            .use_custom_timestamp(timestamp_fn)
            .build()
            .fuse();
        let drain = drain.filter_level(self.level).fuse();
        let drain = slog_async::Async::new(drain)
            .thread_name("logging".to_owned())
            .chan_size(1024)
            .build_no_guard()
            .fuse();

        let logger = slog::Logger::root(drain, slog::o!("thread" => FnValue(thread_name)));

        let global = slog_scope::set_global_logger(logger);
        Ok(Logger(self.level, global))
    }
}

fn thread_name(_: &slog::Record) -> String {
    std::thread::current()
        .name()
        .unwrap_or("unnamed")
        .to_owned()
}

fn uptime(out: &mut dyn Write) -> std::io::Result<()> {
    write!(out, "{:>9.3}", START.elapsed().as_secs_f32())
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            level: Level::Info,
            color: true,
        }
    }
}

impl Logger {
    pub fn level(&self) -> Level {
        self.0
    }
}

impl Display for LogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::BadLevel(s) => write!(f, "Invalid level {:?}", s),
        }
    }
}

impl Error for LogError {}
