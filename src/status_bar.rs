use std::{fmt, path::Path};

use chrono::{Local, Utc};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{info, warn};

use crate::Result;

/// Per-session tally of finished and failed operations, with one timestamped
/// log line per event.
#[derive(Debug, Default)]
pub struct StatusBar {
    done: usize,
    failed: usize,
    log: Vec<String>,
}

impl fmt::Display for StatusBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done \x1b[32m{}\x1b[0m / Failed \x1b[31m{}\x1b[0m",
            self.done, self.failed
        )
    }
}

impl StatusBar {
    fn current_time() -> String {
        Utc::now().with_timezone(&Local).to_rfc3339()
    }

    fn create_log_entry(&mut self, message: &str, log_type: &str) -> String {
        // Create log entry contents for both tracing and log file
        let mut contents = log_type.to_string();
        contents.push_str(message);

        let mut entry = StatusBar::current_time();
        entry.push(' ');
        entry.push_str(&contents);
        self.log.push(entry);

        contents
    }

    pub fn register_done(&mut self, message: &str) {
        self.done += 1;
        let entry = self.create_log_entry(message, "\x1b[32mDone\x1b[0m: ");
        info!("{}", entry);
    }

    pub fn register_err(&mut self, message: &str) {
        self.failed += 1;
        let entry = self.create_log_entry(message, "\x1b[31mErr\x1b[0m: ");
        warn!("{}", entry);
    }

    // Appends contents of self.log to a log file
    pub async fn write_log_to_file(&self, file_path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .await?;

        let mut buffer = Vec::new();

        for log_entry in &self.log {
            buffer.extend_from_slice(&strip_ansi_escapes::strip(log_entry.as_bytes()));
            buffer.extend_from_slice(b"\n");
        }

        buffer.extend_from_slice(b"Total: ");
        buffer.extend_from_slice(&strip_ansi_escapes::strip(self.to_string().as_bytes()));
        buffer.extend_from_slice(b"     (Log generated at: ");
        buffer.extend_from_slice(StatusBar::current_time().as_bytes());
        buffer.extend_from_slice(b")\n\n");

        file.write_all(&buffer).await?;
        Ok(())
    }
}
