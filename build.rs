//! Embed the telemetry version shown in report metadata.
//!
//! Uses `git describe --tags --dirty` when available and falls back to
//! `CARGO_PKG_VERSION`. The `GIT` environment variable selects another git
//! executable.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn describe_version() -> Option<String> {
    let git = env::var("GIT").unwrap_or_else(|_| "git".into());
    let output = Command::new(git)
        .args(["describe", "--tags", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let description = String::from_utf8(output.stdout).ok()?;
    let line = description.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(format!("git-{}", line))
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GIT");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR environment variable not set");
    let dest_path = Path::new(&out_dir).join("version.rs");

    let version = describe_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_owned());
    let source = format!(
        "/// Telemetry version recorded in report metadata\npub const VERSION: &str = {:?};\n",
        version
    );
    fs::write(&dest_path, source).expect("Failed to write version.rs");
}
