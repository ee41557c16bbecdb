//! Build script for the poller binary.
//!
//! Records the compiler version for `/api/v1/config` and forwards the
//! packager-supplied branch and build date.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=POLLER_BUILD_BRANCH");
    println!("cargo:rerun-if-env-changed=POLLER_BUILD_DATE");

    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=POLLER_RUSTC_VERSION={version}");
}
