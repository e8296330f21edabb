//! Build script that stamps the gateway version and git SHA into the binary.
//!
//! - GOVEE_GATEWAY_VERSION: release version (defaults to CARGO_PKG_VERSION)
//! - GOVEE_GATEWAY_GIT_SHA: short commit SHA (defaults to GITHUB_SHA, then `git rev-parse`)

use std::process::Command;

fn main() {
    let version = std::env::var("GOVEE_GATEWAY_VERSION").unwrap_or_else(|_| {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".into())
    });
    println!("cargo:rustc-env=GOVEE_GATEWAY_VERSION={}", version);

    let git_sha = std::env::var("GOVEE_GATEWAY_GIT_SHA")
        .or_else(|_| std::env::var("GITHUB_SHA").map(|s| s.chars().take(7).collect()))
        .unwrap_or_else(|_| git_short_sha());
    println!("cargo:rustc-env=GOVEE_GATEWAY_GIT_SHA={}", git_sha);

    println!("cargo:rerun-if-env-changed=GOVEE_GATEWAY_VERSION");
    println!("cargo:rerun-if-env-changed=GOVEE_GATEWAY_GIT_SHA");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}

fn git_short_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}
