//! Simple file-based logging for debugging
//!
//! Logging is off until [`init`] or [`init_at`] is called; the `log!` macro
//! is a no-op while uninitialized so library consumers pay nothing for it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Get the directory where the executable is located
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Initialize logging to `wndkit.log` next to the executable
pub fn init() {
    init_at(&exe_dir().join("wndkit.log"));
}

/// Initialize logging to an explicit path
///
/// Idempotent: the first call wins, later calls are ignored.
pub fn init_at(path: &Path) {
    let Ok(mut guard) = LOG_FILE.lock() else {
        return;
    };
    if guard.is_some() {
        return;
    }

    if let Ok(file) = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        *guard = Some(file);
    }
    drop(guard);

    log("=== wndkit log started ===");
}

/// Get current timestamp as milliseconds
fn timestamp() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Log a message to the file
pub fn log(msg: &str) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let ts = timestamp();
            let _ = writeln!(file, "[{}] {}", ts, msg);
            let _ = file.flush();
        }
    }
}

/// Log a formatted message
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        $crate::log::log(&format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_without_init_is_silent() {
        // Must not panic or touch the filesystem when uninitialized.
        log("dropped on the floor");
    }

    #[test]
    fn test_exe_dir_is_not_empty() {
        assert!(!exe_dir().as_os_str().is_empty());
    }
}
