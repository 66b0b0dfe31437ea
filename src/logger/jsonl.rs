//! JSONL session log: one self-contained JSON object per lifecycle event.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! tailing process never sees a partial line.
//!
//! Degradation chain:
//! 1. Configured file path
//! 2. stderr with `[ATR-JSONL]` prefix
//! 3. Silent discard (logging never fails the dashboard)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{AttractorError, Result};
use crate::view::model::{LifecycleEvent, LoadTicket};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Event kinds written to the session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    DatasetSelected,
    LoadStarted,
    LoadSucceeded,
    LoadFailed,
    StaleLoadDiscarded,
    ActiveFileChanged,
}

/// A single JSONL log entry. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Dataset type the event concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Load cycle generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Number of records committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
    /// Selected file (active file events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            dataset: None,
            generation: None,
            records: None,
            file_prefix: None,
            filename: None,
            error_message: None,
            details: None,
        }
    }

    fn for_ticket(event: EventType, severity: Severity, ticket: &LoadTicket) -> Self {
        let mut entry = Self::new(event, severity);
        entry.dataset = Some(ticket.dataset.to_string());
        entry.generation = Some(ticket.generation);
        entry
    }

    /// Project a controller lifecycle event onto a log line.
    #[must_use]
    pub fn from_lifecycle(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::DatasetSelected { dataset } => {
                let mut entry = Self::new(EventType::DatasetSelected, Severity::Info);
                entry.dataset = Some(dataset.to_string());
                entry
            }
            LifecycleEvent::LoadStarted { ticket } => {
                Self::for_ticket(EventType::LoadStarted, Severity::Info, ticket)
            }
            LifecycleEvent::LoadSucceeded {
                ticket,
                records,
                file_prefix,
            } => {
                let mut entry = Self::for_ticket(EventType::LoadSucceeded, Severity::Info, ticket);
                entry.records = Some(*records);
                entry.file_prefix.clone_from(file_prefix);
                entry
            }
            LifecycleEvent::LoadFailed { ticket, error } => {
                let mut entry = Self::for_ticket(EventType::LoadFailed, Severity::Error, ticket);
                entry.error_message = Some(error.to_string());
                entry
            }
            LifecycleEvent::StaleLoadDiscarded { ticket } => {
                Self::for_ticket(EventType::StaleLoadDiscarded, Severity::Warning, ticket)
            }
            LifecycleEvent::ActiveFileChanged { filename } => {
                let mut entry = Self::new(EventType::ActiveFileChanged, Severity::Info);
                entry.filename.clone_from(filename);
                entry
            }
        }
    }
}

/// Degradation state of the JSONL writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Configuration for the JSONL writer.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Size at which the file is rotated.
    pub max_size_bytes: u64,
    /// Rotated files kept next to the live one.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    /// Writer settings from the `[logging]` section; `None` when disabled.
    #[must_use]
    pub fn from_logging(logging: &LoggingConfig) -> Option<Self> {
        logging.jsonl_path.as_ref().map(|path| Self {
            path: path.clone(),
            max_size_bytes: logging.max_size_bytes,
            max_rotated_files: logging.max_rotated_files,
        })
    }
}

/// Append-only JSONL log writer with rotation and stderr fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file. Falls through the degradation chain on failure.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[ATR-JSONL] {e}; logging to stderr");
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    /// Write a single log entry as one JSONL line, flushed immediately.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[ATR-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let written = self.writer.as_mut().is_some_and(|w| {
                    w.write_all(line.as_bytes())
                        .and_then(|()| w.flush())
                        .is_ok()
                });
                if written {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[ATR-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(io::stderr(), "[ATR-JSONL] write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = self.config.path.clone();
        // .N-1 → .N, …, .1 → .2, live → .1
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AttractorError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AttractorError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// Build a rotated filename: `session.jsonl` → `session.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
