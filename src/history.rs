//! Append-only, date-partitioned record of every exporter invocation.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;

static LOG_STEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}$").expect("invalid history stem regex"));
const LOG_EXTENSION: &str = "log";
const DATE_STEM_FORMAT: &str = "%Y%m%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes one line per run to `<dir>/<YYYYMMDD>.log`. Entries are never
/// rewritten, and a failed append never reaches the caller.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    dir: PathBuf,
}

impl HistoryLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn log_path_for(&self, date: NaiveDate) -> PathBuf {
        let stem = date.format(DATE_STEM_FORMAT);
        self.dir.join(format!("{stem}.{LOG_EXTENSION}"))
    }

    /// Records a run outcome in today's file. Failures are only logged.
    pub fn append(&self, command_line: &str, success: bool, summary: Option<&str>) {
        let now = Local::now();
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let entry = format_entry(&timestamp, command_line, success, summary);
        let path = self.log_path_for(now.date_naive());
        match self.write_entry(&path, &entry) {
            Ok(()) => debug!("History entry written to {}", path.display()),
            Err(err) => error!(
                "Failed to write history entry to {}: {}",
                path.display(),
                err
            ),
        }
    }

    fn write_entry(&self, path: &Path, entry: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(entry.as_bytes())
    }

    pub fn read_today(&self) -> Vec<String> {
        self.read_date(Local::now().date_naive())
    }

    /// Entries for the given day, oldest first. A missing or unreadable file
    /// reads as empty.
    pub fn read_date(&self, date: NaiveDate) -> Vec<String> {
        let path = self.log_path_for(date);
        match fs::read_to_string(&path) {
            Ok(content) => content.lines().map(ToOwned::to_owned).collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No history file at {}", path.display());
                Vec::new()
            }
            Err(err) => {
                error!("Failed to read history file {}: {}", path.display(), err);
                Vec::new()
            }
        }
    }

    /// `YYYYMMDD` stems of every `*.log` file in the directory, ascending.
    pub fn list_available_dates(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                error!(
                    "Failed to list history directory {}: {}",
                    self.dir.display(),
                    err
                );
                return Vec::new();
            }
        };

        let mut dates: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(ToOwned::to_owned)
            })
            .filter(|stem| LOG_STEM_REGEX.is_match(stem))
            .collect();
        dates.sort();
        dates
    }
}

/// `[timestamp] STATUS: command[ | summary]` followed by a newline.
pub fn format_entry(
    timestamp: &str,
    command_line: &str,
    success: bool,
    summary: Option<&str>,
) -> String {
    let status = if success { "SUCCESS" } else { "FAILED" };
    let mut entry = format!("[{timestamp}] {status}: {command_line}");
    if let Some(summary) = summary.filter(|text| !text.is_empty()) {
        entry.push_str(" | ");
        entry.push_str(summary);
    }
    entry.push('\n');
    entry
}

/// Renders a `YYYYMMDD` stem as `YYYY-MM-DD`; other input is returned as is.
pub fn display_date(stem: &str) -> String {
    NaiveDate::parse_from_str(stem, DATE_STEM_FORMAT)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| stem.to_string())
}
