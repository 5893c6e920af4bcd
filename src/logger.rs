//! Session log written to the OS data directory, truncated at each launch so
//! it only ever holds the most recent run.
//!
//!   Linux:    `~/.local/share/MangaMark/mangamark.log`
//!   macOS:    `~/Library/Application Support/MangaMark/mangamark.log`
//!   Windows:  `%APPDATA%\MangaMark\mangamark.log`
//!
//! Call [`init`] once at startup, then log through `log_info!` /
//! `log_warn!` / `log_err!`. Before `init` (and in library consumers that
//! never call it) every macro is a no-op, so library code can log freely.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

struct Session {
    file: Mutex<File>,
    path: PathBuf,
    started: Instant,
}

static SESSION: OnceLock<Session> = OnceLock::new();

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::logger::write("INFO", &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::logger::write("WARN", &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {{
        $crate::logger::write("ERROR", &format!($($arg)*));
    }};
}

/// Set up the session log file and a panic hook that mirrors panic messages
/// into it. I/O failure here is reported once and logging stays disabled;
/// it never aborts the run.
pub fn init() {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] could not open {}: {}", path.display(), e);
            return;
        }
    };

    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let _ = SESSION.set(Session {
        file: Mutex::new(file),
        path: path.clone(),
        started: Instant::now(),
    });
    write("INFO", &format!("session started (unix {})", epoch));
    write("INFO", &format!("log file: {}", path.display()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write("PANIC", &info.to_string());
        prev(info);
    }));
}

/// Where the current session log lives, once [`init`] has run.
pub fn log_path() -> Option<&'static PathBuf> {
    SESSION.get().map(|s| &s.path)
}

/// Append one level-tagged line, stamped with seconds since session start.
/// A no-op before [`init`]; write errors are swallowed.
pub fn write(level: &str, msg: &str) {
    if let Some(session) = SESSION.get()
        && let Ok(mut file) = session.file.lock()
    {
        let t = session.started.elapsed().as_secs_f64();
        let _ = writeln!(file, "[{:9.3}] [{}] {}", t, level, msg);
    }
}

fn log_file_path() -> PathBuf {
    data_dir().join("MangaMark").join("mangamark.log")
}

fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata);
    }
    #[cfg(target_os = "macos")]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Library").join("Application Support");
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}
