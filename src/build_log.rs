//! Detects whether the most recent Xcode build succeeded.
//!
//! Xcode writes one gzip-compressed `.xcactivitylog` per build into
//! `<DerivedData target>/Logs/Build`. The last word of a decompressed log is
//! the build outcome.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Result, XcHelperError};

/// Extension of Xcode build-log archives.
pub const BUILD_LOG_EXTENSION: &str = ".xcactivitylog";

/// Trailing marker of a successful build.
pub const SUCCESS_MARKER: &str = "succeeded";

/// Number of trailing characters inspected.
const TAIL_LENGTH: usize = 9;

/// Derive the log directory from a build products directory.
///
/// `.../target/Build/Products` -> `.../target/Logs/Build`
pub fn log_directory(build_products_dir: &Path) -> PathBuf {
    let build_dir = build_products_dir.parent().unwrap_or(build_products_dir);
    let target_dir = build_dir.parent().unwrap_or(build_dir);
    target_dir.join("Logs").join("Build")
}

/// Newest `.xcactivitylog` in the log directory, by modification time.
///
/// A missing or unreadable directory means there is no log.
pub fn latest_build_log(log_dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %log_dir.display(), error = %e, "cannot list build logs");
            return None;
        }
    };

    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .flatten()
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();

    logs.sort_by(|a, b| b.0.cmp(&a.0));

    logs.into_iter().map(|(_, path)| path).find(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(BUILD_LOG_EXTENSION))
    })
}

/// Decompress a build log and return its last nine characters.
///
/// Text shorter than nine characters is returned whole.
pub fn decode_log_tail(log_path: &Path) -> Result<String> {
    let file = fs::File::open(log_path).map_err(|e| {
        XcHelperError::LogDecode(format!("{}: {}", log_path.display(), e))
    })?;

    let mut bytes = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| XcHelperError::LogDecode(format!("{}: {}", log_path.display(), e)))?;

    Ok(tail(&String::from_utf8_lossy(&bytes), TAIL_LENGTH))
}

fn tail(text: &str, count: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(count)).collect()
}

/// Whether the last Xcode build for `build_products_dir` succeeded.
///
/// Only a log ending in exactly `succeeded` counts. Anything else, including
/// no log at all, is "not succeeded".
pub fn last_build_was_success(build_products_dir: &Path) -> Result<bool> {
    let log_dir = log_directory(build_products_dir);
    let Some(log) = latest_build_log(&log_dir) else {
        debug!(dir = %log_dir.display(), "no build log found");
        return Ok(false);
    };

    let ending = decode_log_tail(&log)?;
    debug!(log = %log.display(), ending = %ending, "decoded build log");
    Ok(ending == SUCCESS_MARKER)
}
