//! Process-wide logging. Two loggers share the `log` facade: the terse, user-facing one (target
//! [`crate::MAIN`]) and the detailed "function" logger (every other target). Console output is only
//! attached in verbose mode; both always write to two size-rotated files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::logs::lock_scopes;
use crate::{format_log_record, LogContext, MAIN};

pub const ALL_MESSAGES: &str = "all_messages.log";
pub const WARNINGS: &str = "warning_n_above.log";
pub const DEFAULT_MAX_BYTES: u64 = 10_000_000;

// Dependencies that are chatty at debug level.
const NOISY_TARGETS: [&str; 6] = ["hyper", "reqwest", "rustls", "h2", "want", "mio"];

pub struct LoggerConfig {
    /// Attach console output.
    pub verbose: bool,
    pub log_dir: PathBuf,
    /// Files are rotated once they would grow past this.
    pub max_bytes: u64,
}

/// Installs the global logger and returns the context used to open per-layer scopes. Must only
/// be called once per process.
pub fn setup(config: &LoggerConfig) -> Result<LogContext> {
    fs_err::create_dir_all(&config.log_dir)?;
    let ctx = LogContext::default();
    let logger = MapperLogger {
        console: config.verbose,
        all: Mutex::new(RotatingFile::open(
            config.log_dir.join(ALL_MESSAGES),
            config.max_bytes,
        )?),
        warnings: Mutex::new(RotatingFile::open(
            config.log_dir.join(WARNINGS),
            config.max_bytes,
        )?),
        scopes: ctx.shared_scopes(),
    };
    log::set_boxed_logger(Box::new(logger)).context("installing the logger")?;
    log::set_max_level(LevelFilter::Debug);
    Ok(ctx)
}

struct MapperLogger {
    console: bool,
    all: Mutex<RotatingFile>,
    warnings: Mutex<RotatingFile>,
    scopes: Arc<Mutex<Vec<String>>>,
}

impl Log for MapperLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if NOISY_TARGETS
            .iter()
            .any(|prefix| metadata.target().starts_with(prefix))
        {
            return metadata.level() <= Level::Warn;
        }
        if metadata.target() == MAIN {
            return metadata.level() <= Level::Info;
        }
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let scope = lock_scopes(&self.scopes).last().cloned();

        if self.console {
            println!("{}", format_log_record(record, scope.as_deref(), true));
        }
        // Debug output only ever goes to the console
        if record.level() > Level::Info {
            return;
        }
        let line = format_log_record(record, scope.as_deref(), false);
        // Nowhere left to report a failure to write the log itself
        let _ = lock(&self.all).write_line(&line);
        if record.level() <= Level::Warn {
            let _ = lock(&self.warnings).write_line(&line);
        }
    }

    fn flush(&self) {
        let _ = lock(&self.all).flush();
        let _ = lock(&self.warnings).flush();
    }
}

fn lock(file: &Mutex<RotatingFile>) -> std::sync::MutexGuard<'_, RotatingFile> {
    file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An append-only log file. When the next line would push it past `max_bytes`, the current file
/// is moved to `<path>.1` (replacing any older backup) and a fresh one is started.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    file: fs_err::File,
    written: u64,
}

impl RotatingFile {
    pub fn open<P: Into<PathBuf>>(path: P, max_bytes: u64) -> Result<RotatingFile> {
        let path = path.into();
        let file = fs_err::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let written = file.metadata()?.len();
        Ok(RotatingFile {
            path,
            max_bytes,
            file,
            written,
        })
    }

    pub fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }
        writeln!(self.file, "{}", line)?;
        self.written += len;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }

    pub fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.as_os_str().to_os_string();
        backup.push(".1");
        PathBuf::from(backup)
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        self.file.flush()?;
        fs_err::rename(&self.path, RotatingFile::backup_path(&self.path))?;
        self.file = fs_err::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RotatingFile;

    #[test]
    fn test_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_messages.log");
        let mut file = RotatingFile::open(path.clone(), 20).unwrap();

        // 10 bytes each including the newline
        file.write_line("123456789").unwrap();
        file.write_line("abcdefghi").unwrap();
        assert!(!RotatingFile::backup_path(&path).exists());

        file.write_line("rotate me").unwrap();
        file.flush().unwrap();
        let backup = RotatingFile::backup_path(&path);
        assert_eq!(
            "123456789\nabcdefghi\n",
            std::fs::read_to_string(&backup).unwrap()
        );
        assert_eq!("rotate me\n", std::fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn test_appends_to_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warning_n_above.log");
        std::fs::write(&path, "old line\n").unwrap();

        let mut file = RotatingFile::open(path.clone(), 1_000).unwrap();
        file.write_line("new line").unwrap();
        file.flush().unwrap();
        assert_eq!(
            "old line\nnew line\n",
            std::fs::read_to_string(&path).unwrap()
        );
    }
}
