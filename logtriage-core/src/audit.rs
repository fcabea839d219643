use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Append one execution record to the flat audit log.
///
/// Only the input's base name is recorded, not its full path. A write
/// failure is reported but never propagated; auditing must not take the
/// run down with it.
pub fn record_run(log_path: &Path, status: RunStatus, input_file: &Path) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let base_name = input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_file.display().to_string());
    let entry = format!("[{}] [{}] Input: {}\n", timestamp, status, base_name);

    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .and_then(|mut file| file.write_all(entry.as_bytes()));

    if let Err(e) = result {
        error!("Failed to write audit entry to {}: {}", log_path.display(), e);
        eprintln!(
            "[CRITICAL] Failed to write to audit log '{}': {}",
            log_path.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_run_appends_entries() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("usage.log");

        record_run(&log_path, RunStatus::Success, Path::new("/var/log/app.log"));
        record_run(&log_path, RunStatus::Failure, Path::new("broken.log"));

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[SUCCESS] Input: app.log"));
        assert!(lines[1].contains("[FAILURE] Input: broken.log"));
    }

    #[test]
    fn test_record_run_swallows_write_failures() {
        // Pointing at a directory makes the open fail; the call must not
        // panic or return an error.
        let dir = tempdir().unwrap();
        record_run(dir.path(), RunStatus::Success, Path::new("app.log"));
    }
}
