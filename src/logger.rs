// Session log: one file per run, buffered until exit unless streaming
use anyhow::Result;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_RETENTION: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

pub struct SessionLogger {
    log_buffer: Mutex<Vec<String>>,
    log_path: PathBuf,
    log_dir: PathBuf,
    retention_count: usize,
    app_name: String,
    stream: bool,
}

impl SessionLogger {
    pub fn new(log_dir: PathBuf, app_name: &str, retention_count: usize, stream: bool) -> Result<Self> {
        fs::create_dir_all(&log_dir)?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_filename = format!("{}_{}.log", app_name, timestamp);
        let log_path = log_dir.join(&log_filename);

        let logger = Self {
            log_buffer: Mutex::new(Vec::new()),
            log_path,
            log_dir,
            retention_count,
            app_name: app_name.to_string(),
            stream,
        };

        logger.clean_old_logs()?;
        logger.log(format!("=== {} Session Started ===", app_name));

        Ok(logger)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.write(Level::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Level::Error, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.write(Level::Warn, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Level::Info, message.as_ref());
    }

    fn write(&self, level: Level, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let log_line = match level {
            Level::Info => format!("[{}] {}", timestamp, message),
            Level::Warn => format!("[{}] WARN: {}", timestamp, message),
            Level::Error => format!("[{}] ERROR: {}", timestamp, message),
        };

        if self.stream {
            match level {
                Level::Info => tracing::info!("{}", message),
                Level::Warn => tracing::warn!("{}", message),
                Level::Error => tracing::error!("{}", message),
            }
            let _ = self.write_line_to_file(&log_line);
        } else {
            self.log_buffer.lock().push(log_line);
        }
    }

    fn write_line_to_file(&self, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    fn clean_old_logs(&self) -> Result<()> {
        let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        let prefix = format!("{}_", self.app_name);

        if let Ok(entries) = fs::read_dir(&self.log_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("log") {
                    continue;
                }
                let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !filename.starts_with(&prefix) {
                    continue;
                }
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    log_files.push((path, modified));
                }
            }
        }

        // Newest first; the session about to start counts against retention
        log_files.sort_by(|a, b| b.1.cmp(&a.1));

        for (path, _) in log_files.iter().skip(self.retention_count.saturating_sub(1)) {
            let _ = fs::remove_file(path);
        }

        Ok(())
    }

    pub fn flush_to_disk(&self) -> Result<()> {
        let mut buffer = self.log_buffer.lock();
        if buffer.is_empty() {
            return Ok(());
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        for line in buffer.iter() {
            writeln!(file, "{}", line)?;
        }

        file.flush()?;
        buffer.clear();

        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        self.log(format!("=== {} Session Ended ===", self.app_name));
        self.flush_to_disk()?;
        Ok(())
    }
}

static LOGGER: once_cell::sync::OnceCell<SessionLogger> = once_cell::sync::OnceCell::new();

/// Default log directory: `%APPDATA%\Mirage\logs`, or `./logs` when APPDATA is unset.
pub fn default_log_dir() -> PathBuf {
    match std::env::var("APPDATA") {
        Ok(app_data) => PathBuf::from(app_data).join("Mirage").join("logs"),
        Err(_) => PathBuf::from("logs"),
    }
}

pub fn init_logger(log_dir: PathBuf, app_name: &str, retention_count: usize, stream: bool) -> Result<()> {
    if stream {
        let _ = tracing_subscriber::fmt()
            .with_target(false)
            .without_time()
            .try_init();
    }

    let logger = SessionLogger::new(log_dir, app_name, retention_count, stream)?;
    LOGGER.set(logger).map_err(|_| anyhow::anyhow!("Logger already initialized"))?;
    Ok(())
}

pub fn log_error(message: impl AsRef<str>) {
    if let Some(logger) = LOGGER.get() {
        logger.error(message);
    }
}

pub fn log_warn(message: impl AsRef<str>) {
    if let Some(logger) = LOGGER.get() {
        logger.warn(message);
    }
}

pub fn log_info(message: impl AsRef<str>) {
    if let Some(logger) = LOGGER.get() {
        logger.info(message);
    }
}

pub fn finalize_logs() -> Result<()> {
    if let Some(logger) = LOGGER.get() {
        logger.finalize()?;
    }
    Ok(())
}

pub fn get_log_path() -> Option<PathBuf> {
    LOGGER.get().map(|logger| logger.log_path.clone())
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log_info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log_warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log_error(format!($($arg)*))
    };
}
