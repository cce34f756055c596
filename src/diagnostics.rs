//! Log file housekeeping.
//!
//! The daily appender set up in `lib.rs` writes `resto-admin.YYYY-MM-DD`
//! files into the configured log directory; only the newest few are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::AppConfig;

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// File name prefix used by the rolling appender.
pub const LOG_FILE_PREFIX: &str = "resto-admin";

pub fn log_dir(cfg: &AppConfig) -> PathBuf {
    cfg.log_dir()
}

fn is_log_file(name: &str) -> bool {
    name == LOG_FILE_PREFIX
        || name
            .strip_prefix(LOG_FILE_PREFIX)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Remove all but the newest `keep` log files in `dir`. Returns how many
/// files were deleted.
pub fn prune_old_logs(dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let mut log_files: Vec<(PathBuf, SystemTime)> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_log_file))
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (entry.path(), modified)
        })
        .collect();

    // Newest first; equal timestamps fall back to the dated name.
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to prune log file {}: {e}", path.display()),
        }
    }
    if removed > 0 {
        debug!(removed, dir = %dir.display(), "old log files pruned");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_appender_files_count_as_logs() {
        assert!(is_log_file("resto-admin.2026-10-01"));
        assert!(is_log_file("resto-admin"));
        assert!(!is_log_file("resto-admin-old.txt"));
        assert!(!is_log_file("session"));
    }

    #[test]
    fn keeps_the_newest_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        for day in 1..=13 {
            fs::write(dir.path().join(format!("resto-admin.2026-10-{day:02}")), "x").expect("write");
        }
        fs::write(dir.path().join("notes.txt"), "keep me").expect("write");

        assert_eq!(prune_old_logs(dir.path(), MAX_LOG_FILES), 3);
        let mut left: Vec<String> = fs::read_dir(dir.path())
            .expect("read_dir")
            .flatten()
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        left.sort();
        assert_eq!(left.len(), MAX_LOG_FILES + 1);
        assert!(left.contains(&"notes.txt".to_string()));
        assert!(left.contains(&"resto-admin.2026-10-13".to_string()));
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        assert_eq!(prune_old_logs(Path::new("/nonexistent/resto-admin-logs"), 1), 0);
    }
}
