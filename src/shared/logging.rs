use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub event: String,
    pub message: String,
}

#[derive(Debug, Clone)]
enum Sink {
    Stderr { file: Option<PathBuf> },
    Memory(Rc<RefCell<Vec<LogRecord>>>),
}

/// Diagnostic stream for discovery and fallback decisions.
///
/// Lines go to stderr so stdout stays reserved for command output. When a log
/// file is configured each event is also appended there as one JSON object.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    sink: Sink,
}

impl DiagnosticLog {
    pub fn stderr() -> Self {
        Self {
            sink: Sink::Stderr { file: None },
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            sink: Sink::Stderr {
                file: Some(path.into()),
            },
        }
    }

    pub fn memory() -> Self {
        Self {
            sink: Sink::Memory(Rc::new(RefCell::new(Vec::new()))),
        }
    }

    pub fn info(&self, event: &str, message: impl Into<String>) {
        self.emit(LogLevel::Info, event, message.into());
    }

    pub fn warn(&self, event: &str, message: impl Into<String>) {
        self.emit(LogLevel::Warn, event, message.into());
    }

    /// Events captured by a memory log. Always empty for stderr logs.
    pub fn records(&self) -> Vec<LogRecord> {
        match &self.sink {
            Sink::Memory(records) => records.borrow().clone(),
            Sink::Stderr { .. } => Vec::new(),
        }
    }

    pub fn contains_event(&self, event: &str) -> bool {
        self.records().iter().any(|record| record.event == event)
    }

    fn emit(&self, level: LogLevel, event: &str, message: String) {
        match &self.sink {
            Sink::Memory(records) => records.borrow_mut().push(LogRecord {
                level,
                event: event.to_string(),
                message,
            }),
            Sink::Stderr { file } => {
                match level {
                    LogLevel::Info => eprintln!("  {message}"),
                    LogLevel::Warn => eprintln!("  warning: {message}"),
                }
                if let Some(path) = file {
                    append_json_line(path, level, event, &message);
                }
            }
        }
    }
}

fn append_json_line(path: &Path, level: LogLevel, event: &str, message: &str) {
    let payload = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "level": level.as_str(),
        "event": event,
        "message": message,
    });
    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_log_keeps_events_in_order() {
        let log = DiagnosticLog::memory();
        log.info("discovery.hit", "cache hit");
        log.warn("discovery.failed", "admin api unreachable");

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[1].event, "discovery.failed");
        assert!(log.contains_event("discovery.hit"));
    }

    #[test]
    fn memory_log_clones_share_one_buffer() {
        let log = DiagnosticLog::memory();
        let clone = log.clone();
        clone.info("a", "b");
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn file_log_appends_json_lines() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("logs/opskit.log");
        let log = DiagnosticLog::with_file(&path);
        log.warn("discovery.failed", "boom");
        log.info("api_base.heuristic", "emea");

        let raw = fs::read_to_string(&path).expect("read log");
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "warn");
        assert_eq!(lines[0]["event"], "discovery.failed");
        assert_eq!(lines[1]["message"], "emea");
        assert!(lines[1]["timestamp"].as_str().is_some());
    }
}
