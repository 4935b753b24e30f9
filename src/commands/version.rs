//! Command: print version information.

/// Version string baked in at build time, falling back to the crate version.
#[must_use]
pub fn current() -> &'static str {
    option_env!("CASKBATCH_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the caskbatch version to stdout.
pub fn run() {
    println!("caskbatch {}", current());
}
