//! Build script for recipe-tagger
//!
//! Embeds identification for the startup log line: short git commit, build
//! time (UTC) and cargo profile. Each falls back to "unknown" when the value
//! is not available, e.g. when building from a source archive.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout)
        .ok()
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=RECIPE_TAGGER_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=RECIPE_TAGGER_BUILT_AT={}", built_at);
    println!("cargo:rustc-env=RECIPE_TAGGER_PROFILE={}", profile);

    // Commit changes move HEAD; sources are tracked by cargo already
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
