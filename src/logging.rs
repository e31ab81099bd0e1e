use log::{LevelFilter, Metadata, Record};
use std::sync::Mutex;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use chrono::Local;

/// Appends timestamped log lines to a file. Used instead of `env_logger`
/// when the config names a log file.
pub struct FileLogger {
    file: Mutex<std::fs::File>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn new(log_file: &Path, level: LevelFilter) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;

        Ok(Self {
            file: Mutex::new(file),
            level,
        })
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            // A failed write has nowhere better to be reported.
            let _ = writeln!(
                file,
                "{} [{}] {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Parses a level name from the config, falling back to `Info`.
pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

pub fn init(log_file: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let logger = FileLogger::new(log_file, level)?;
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| anyhow::anyhow!("Failed to install file logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}
