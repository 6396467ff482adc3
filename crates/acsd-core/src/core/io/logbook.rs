//! The run logbook: a human-readable, timestamped audit trail written next to the
//! harvested structures.
//!
//! Pipeline code writes through an [`EntryLog`], which stamps each line and either
//! appends it straight away ([`FlushPolicy::Immediate`]) or keeps it until the entry is
//! done and appends the whole block at once ([`FlushPolicy::Buffered`]). With several
//! workers the buffered policy keeps each identifier's lines contiguous in the file.

use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, info, warn};

pub const LOGBOOK_FILE: &str = "ACSD_logfile.log";

const WARNING_PREFIX: &str = "WARNING: ";

/// An append-only, ordered destination for logbook lines.
pub trait LogSink: Send + Sync {
    /// Appends all lines as one uninterrupted block.
    fn append(&self, lines: &[String]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    Immediate,
    #[default]
    Buffered,
}

#[derive(Debug, Error)]
#[error("Invalid flush policy: '{0}'")]
pub struct ParseFlushPolicyError(pub String);

impl FromStr for FlushPolicy {
    type Err = ParseFlushPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "buffered" => Ok(Self::Buffered),
            _ => Err(ParseFlushPolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for FlushPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Immediate => "immediate",
                Self::Buffered => "buffered",
            }
        )
    }
}

/// The logbook file, opened in append mode and shared by all workers.
#[derive(Debug)]
pub struct Logbook {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl Logbook {
    /// Opens (or creates) `ACSD_logfile.log` inside `directory`.
    pub fn open_in(directory: &Path) -> io::Result<Self> {
        Self::open(directory.join(LOGBOOK_FILE))
    }

    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for Logbook {
    fn append(&self, lines: &[String]) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("logbook lock poisoned"))?;
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()
    }
}

/// A sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn append(&self, lines: &[String]) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .extend_from_slice(lines);
        Ok(())
    }
}

/// The logbook view of one identifier's processing.
///
/// Every message is mirrored to `tracing`. Pending lines are flushed when the log is
/// dropped; sink failures are reported through `tracing` and never abort the entry.
pub struct EntryLog<'a> {
    sink: &'a dyn LogSink,
    policy: FlushPolicy,
    pending: Vec<String>,
}

impl<'a> EntryLog<'a> {
    pub fn new(sink: &'a dyn LogSink, policy: FlushPolicy) -> Self {
        Self {
            sink,
            policy,
            pending: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{}", message);
        self.push(message);
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        warn!("{}", message);
        self.push(&format!("{}{}", WARNING_PREFIX, message));
    }

    /// Appends any buffered lines to the sink.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Err(e) = self.sink.append(&self.pending) {
            error!("Failed to write {} logbook line(s): {}", self.pending.len(), e);
        }
        self.pending.clear();
    }

    fn push(&mut self, message: &str) {
        let line = format!("{} - {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), message);
        self.pending.push(line);
        if self.policy == FlushPolicy::Immediate {
            self.flush();
        }
    }
}

impl Drop for EntryLog<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn message_part(line: &str) -> &str {
        line.split_once(" - ").map(|(_, m)| m).unwrap()
    }

    #[test]
    fn flush_policy_parses_case_insensitively() {
        assert_eq!("Immediate".parse::<FlushPolicy>().unwrap(), FlushPolicy::Immediate);
        assert_eq!("BUFFERED".parse::<FlushPolicy>().unwrap(), FlushPolicy::Buffered);
        assert!("later".parse::<FlushPolicy>().is_err());
        assert_eq!(FlushPolicy::default().to_string(), "buffered");
    }

    #[test]
    fn immediate_policy_writes_each_line_at_once() {
        let sink = MemorySink::new();
        let mut log = EntryLog::new(&sink, FlushPolicy::Immediate);
        log.info("first");
        assert_eq!(sink.lines().len(), 1);
        log.warning("second");
        let lines = sink.lines();
        assert_eq!(message_part(&lines[0]), "first");
        assert_eq!(message_part(&lines[1]), "WARNING: second");
    }

    #[test]
    fn buffered_policy_defers_until_drop() {
        let sink = MemorySink::new();
        {
            let mut log = EntryLog::new(&sink, FlushPolicy::Buffered);
            log.info("a");
            log.info("b");
            assert!(sink.lines().is_empty());
        }
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(message_part(&lines[1]), "b");
    }

    #[test]
    fn lines_carry_a_timestamp_prefix() {
        let sink = MemorySink::new();
        EntryLog::new(&sink, FlushPolicy::Immediate).info("stamped");
        let line = &sink.lines()[0];
        let (stamp, _) = line.split_once(" - ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.3f").is_ok());
    }

    #[test]
    fn logbook_appends_across_openings() {
        let dir = tempdir().unwrap();
        {
            let book = Logbook::open_in(dir.path()).unwrap();
            book.append(&["one".to_string()]).unwrap();
        }
        let book = Logbook::open_in(dir.path()).unwrap();
        book.append(&["two".to_string(), "three".to_string()]).unwrap();

        let content = std::fs::read_to_string(book.path()).unwrap();
        assert_eq!(content, "one\ntwo\nthree\n");
    }
}
