//! The [`Log`] trait shared by the console logger and test doubles.

/// Where the install workflow reports progress: [`Logger`](super::logger::Logger)
/// in the binary, a capturing double in tests.
pub trait Log: Send + Sync {
    /// Log a stage header, e.g. `Step 2/5: Filtering for Casks/font/`.
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Relay one line printed by the package manager.
    fn output(&self, line: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
}
