use std::process::Command;

const VERSION_VAR: &str = "CASKBATCH_VERSION";

/// `git describe` for the checkout being built, if it is one.
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (output.status.success() && !described.is_empty()).then(|| described.to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed={VERSION_VAR}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    // Release builds pass the version in; local builds describe the checkout.
    if let Some(version) = std::env::var(VERSION_VAR).ok().or_else(describe) {
        println!("cargo:rustc-env={VERSION_VAR}={version}");
    }
}
