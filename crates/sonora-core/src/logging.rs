//! Logging configuration
//!
//! The subscriber itself is installed by the host binary; this module only
//! describes where and how much to log, and manages the log directory.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level ("trace", "debug", "info", "warn", "error")
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_directory`
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// File name prefix for log files
    pub file_prefix: String,
    /// Number of log files kept by `cleanup_old_logs`
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            file_prefix: "sonora".to_string(),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Level filter for `level`, INFO when unrecognized
    pub fn parse_level(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" => LevelFilter::ERROR,
            "warn" | "warning" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO,
        }
    }

    /// Create the log directory if needed
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_directory)?;
        }
        Ok(())
    }

    /// Path of the log file for the current run
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        self.log_directory
            .join(format!("{}_{}.log", self.file_prefix, stamp))
    }

    /// Delete the oldest log files so at most `max_log_files - 1` remain
    /// (leaving room for the file about to be created).
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.is_dir() {
            return Ok(0);
        }

        let prefix = format!("{}_", self.file_prefix);
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "log")
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();

        let keep = self.max_log_files.saturating_sub(1);
        if logs.len() <= keep {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - keep;
        for path in &logs[..excess] {
            fs::remove_file(path)?;
        }
        Ok(excess)
    }
}
