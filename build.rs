// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=LUMA_MSD_VERSION");

    // Packagers can pin the version string without a git checkout
    let version = std::env::var("LUMA_MSD_VERSION").unwrap_or_else(|_| describe_build());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// "0.1.0 (abcdef1)" for clean checkouts, "0.1.0 (abcdef1-dirty)" with local
/// changes, plain "0.1.0" outside git
fn describe_build() -> String {
    let package_version = env!("CARGO_PKG_VERSION");

    let Some(hash) = git(&["rev-parse", "--short", "HEAD"]) else {
        return package_version.to_string();
    };

    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());

    if dirty {
        format!("{} ({}-dirty)", package_version, hash)
    } else {
        format!("{} ({})", package_version, hash)
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
