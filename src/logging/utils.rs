//! Helpers shared by the logger and the subscriber.
use std::path::PathBuf;

/// `strftime` pattern for the run log header.
pub(super) const STAMP: &str = "%Y-%m-%d %H:%M:%S %z";
/// `strftime` pattern prefixed to each run log line.
pub(super) const CLOCK: &str = "%H:%M:%S";

/// Remove terminal escape sequences.
///
/// A CSI sequence (`ESC [` ... final byte `@`..=`~`) is dropped whole; any
/// other escape drops the single character after `ESC`. An unterminated
/// CSI sequence swallows the rest of its segment.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut segments = s.split('\x1b');
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        let kept = match segment.strip_prefix('[') {
            Some(csi) => csi
                .find(|c: char| ('@'..='~').contains(&c))
                .and_then(|end| csi.get(end + 1..)),
            None => segment
                .chars()
                .next()
                .and_then(|c| segment.get(c.len_utf8()..)),
        };
        out.push_str(kept.unwrap_or_default());
    }
    out
}

/// Run log for `command`: `$XDG_CACHE_HOME/caskbatch/<command>.log`, falling
/// back to the platform cache directory. Creates the directory.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::cache_dir)?;
    let dir = base.join("caskbatch");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// The local time rendered with `pattern`.
pub(super) fn local_now(pattern: &str) -> String {
    chrono::Local::now().format(pattern).to_string()
}
