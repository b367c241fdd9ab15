use std::sync::{Arc, Mutex};

use log::{Level, Record};
use yansi::Paint;

use crate::MAIN;

/// Explicit handle to the per-layer formatting state of the logger. Components that process one
/// layer at a time take a `&LogContext` and open a scope for the duration of that layer; every
/// line logged while the scope is alive carries the layer's name and filter.
#[derive(Clone, Default)]
pub struct LogContext {
    scopes: Arc<Mutex<Vec<String>>>,
}

impl LogContext {
    /// A context that isn't attached to the global logger. Scopes still nest and release, so
    /// this is what tests and library callers without logging use.
    pub fn detached() -> LogContext {
        LogContext::default()
    }

    pub(crate) fn shared_scopes(&self) -> Arc<Mutex<Vec<String>>> {
        self.scopes.clone()
    }

    /// Prefix log lines with this layer until the returned guard is dropped.
    pub fn layer(&self, name: &str, filter: &str) -> LayerScope<'_> {
        self.lock().push(format!("{} | {}", name, filter));
        LayerScope { ctx: self }
    }

    /// The innermost active scope, if any.
    pub fn current(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        lock_scopes(&self.scopes)
    }
}

pub(crate) fn lock_scopes(
    scopes: &Mutex<Vec<String>>,
) -> std::sync::MutexGuard<'_, Vec<String>> {
    // A panic while holding the lock can't leave a Vec<String> half-updated
    scopes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[must_use = "the scope ends as soon as this guard is dropped"]
pub struct LayerScope<'a> {
    ctx: &'a LogContext,
}

impl Drop for LayerScope<'_> {
    fn drop(&mut self) {
        self.ctx.lock().pop();
    }
}

/// The terse format for the user-facing logger, and the detailed one (module, line and the
/// active layer scope) for everything else.
pub fn format_log_record(record: &Record, scope: Option<&str>, color: bool) -> String {
    let level = if color {
        match record.level() {
            Level::Error | Level::Warn => Paint::red(record.level()).to_string(),
            Level::Info => Paint::white(record.level()).to_string(),
            _ => Paint::cyan(record.level()).to_string(),
        }
    } else {
        record.level().to_string()
    };

    if record.target() == MAIN {
        return format!(
            "{} : {} : {} : {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            MAIN,
            record.args()
        );
    }

    let mut line = format!(
        "{} : File:{} : {} : LOG : ",
        level,
        record.module_path().unwrap_or("?"),
        record.line().unwrap_or(0)
    );
    if let Some(scope) = scope {
        line.push_str(&format!("[{}] ", scope));
    }
    line.push_str(&record.args().to_string());
    line
}
