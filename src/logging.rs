//! Line-oriented logging with timestamps, source locations and optional colour.
//!
//! Every line produced by [`tlog!`] has the shape
//!
//! ```text
//! 20261019T14:02:51.318 - src/feed.rs:88 - feed: assembled 12 item(s)
//! ```
//!
//! Output goes to stderr unless [`set_writer`] installs another sink, which
//! also switches colour off. Post and user identifiers are shortened and,
//! on a terminal, tinted with a colour derived from their content so the
//! same id is easy to follow across lines.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

static COLOUR_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_WRITER: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

/// Detect colour support on stderr. Call once at startup.
pub fn init() {
    COLOUR_ENABLED.store(io::stderr().is_terminal(), Ordering::Relaxed);
}

/// Send all further log lines to `w`, without colour.
pub fn set_writer(w: Box<dyn Write + Send>) {
    COLOUR_ENABLED.store(false, Ordering::Relaxed);
    if let Ok(mut writer) = LOG_WRITER.lock() {
        *writer = w;
    }
}

pub fn colour_enabled() -> bool {
    COLOUR_ENABLED.load(Ordering::Relaxed)
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const WARN: &str = "\x1b[33m";

const ID_COLOURS: &[&str] = &[
    "\x1b[91m", "\x1b[92m", "\x1b[93m", "\x1b[94m", "\x1b[95m", "\x1b[96m", "\x1b[32m",
    "\x1b[34m", "\x1b[35m", "\x1b[36m",
];

const SHORT_ID_LEN: usize = 8;

fn colour_for(id: &str) -> &'static str {
    let hash = id
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    ID_COLOURS[hash as usize % ID_COLOURS.len()]
}

fn shorten(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn tagged(prefix: &str, id: &str) -> String {
    let short = shorten(id);
    if colour_enabled() {
        format!("{}{prefix}{short}{RESET}", colour_for(id))
    } else {
        format!("{prefix}{short}")
    }
}

/// Short form of a post id, e.g. `post:Xk3vQ9aB`.
pub fn post_id(id: &str) -> String {
    tagged("post:", id)
}

/// Short form of a user id, e.g. `user:alice`.
pub fn user_id(id: &str) -> String {
    tagged("user:", id)
}

/// Current wall-clock time as `YYYYMMDDTHH:MM:SS.mmm` (UTC).
pub fn format_timestamp() -> String {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = elapsed.as_secs();
    let (y, m, d) = civil_from_days((secs / 86_400) as i64);
    let day_secs = secs % 86_400;

    format!(
        "{:04}{:02}{:02}T{:02}:{:02}:{:02}.{:03}",
        y,
        m,
        d,
        day_secs / 3600,
        (day_secs % 3600) / 60,
        day_secs % 60,
        elapsed.subsec_millis()
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u64, u64) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Write one formatted line. Used by the macros.
pub fn emit(file: &str, line: u32, msg: &str, warning: bool) {
    let ts = format_timestamp();
    let formatted = match (colour_enabled(), warning) {
        (true, true) => format!("{DIM}{ts} {file}:{line}{RESET} {WARN}WARNING{RESET} {msg}"),
        (true, false) => format!("{DIM}{ts} {file}:{line}{RESET} {msg}"),
        (false, true) => format!("{ts} - {file}:{line} - WARNING {msg}"),
        (false, false) => format!("{ts} - {file}:{line} - {msg}"),
    };
    if let Ok(mut writer) = LOG_WRITER.lock() {
        let _ = writeln!(*writer, "{formatted}");
    }
}

/// Log a line with timestamp and source location.
///
/// ```ignore
/// tlog!("feed: assembled {} item(s)", items.len());
/// tlog!("like: {} settled for {}", logging::post_id(&pid), logging::user_id(&uid));
/// ```
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*), false);
    }};
}

/// Like [`tlog!`], but marks the line as a warning.
#[macro_export]
macro_rules! twarn {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*), true);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_date_matches_known_days() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
    }

    #[test]
    fn ids_are_shortened() {
        assert_eq!(post_id("abcdefghijkl"), "post:abcdefgh");
        assert_eq!(user_id("bob"), "user:bob");
    }
}
