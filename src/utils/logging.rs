// Mon Oct 19 2026 - Alex

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Line-oriented sink handed to every patcher. Components never reach for a
/// global log handle; whoever drives a pass decides where its lines go.
pub trait PatchLog {
    fn emit(&self, line: &str);
}

impl<T: PatchLog + ?Sized> PatchLog for &T {
    fn emit(&self, line: &str) {
        (**self).emit(line)
    }
}

/// Forwards every line to the `log` facade at info level.
pub struct LogSink {
    target: String,
}

impl LogSink {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new("setup_unlock")
    }
}

impl PatchLog for LogSink {
    fn emit(&self, line: &str) {
        log::info!(target: self.target.as_str(), "{}", line);
    }
}

/// Keeps lines in memory, for callers that build their own text log.
#[derive(Default)]
pub struct MemorySink {
    lines: RefCell<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<String> {
        self.lines.borrow_mut().drain(..).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl PatchLog for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

pub struct NullSink;

impl PatchLog for NullSink {
    fn emit(&self, _line: &str) {}
}

pub struct LoggingUtils;

impl LoggingUtils {
    /// `RUST_LOG` wins over the verbosity flag when it is set. With a log
    /// file, lines go there uncolored instead of to stderr.
    pub fn init(verbosity: u8, file_path: Option<&Path>) -> std::io::Result<()> {
        if std::env::var_os("RUST_LOG").is_some() {
            env_logger::try_init().ok();
            return Ok(());
        }

        let level = Self::level_from_verbosity(verbosity);
        let file = match file_path {
            Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
            None => None,
        };

        log::set_boxed_logger(Box::new(CliLogger { level, file: file.map(Mutex::new) })).ok();
        log::set_max_level(level);
        Ok(())
    }

    pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

struct CliLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

fn level_tag(level: Level) -> ColoredString {
    let tag = format!("{:5}", level);
    match level {
        Level::Error => tag.red().bold(),
        Level::Warn => tag.yellow().bold(),
        Level::Info => tag.green(),
        Level::Debug | Level::Trace => tag.dimmed(),
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        match &self.file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{:5} [{}] {}", record.level(), record.target(), record.args());
                }
            }
            None => eprintln!("{} {}", level_tag(record.level()), record.args()),
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut file)) = self.file.as_ref().map(|f| f.lock()) {
            let _ = file.flush();
        }
    }
}
