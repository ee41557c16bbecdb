// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build and process introspection for `/api/v1/config`.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

/// Version details baked in at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub branch: String,
    #[serde(rename = "built")]
    pub date: String,
    #[serde(rename = "rustver")]
    pub rust_version: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            branch: "unknown".to_string(),
            date: "unknown".to_string(),
            rust_version: "unknown".to_string(),
        }
    }
}

/// Allocator statistics, in bytes except `numgc`.
///
/// `malloc` is memory currently allocated by the application, `mtalloc` the
/// bytes in active allocator pages, `memsys` the resident memory the
/// allocator holds from the OS. Rust has no garbage collector, so `numgc`
/// stays 0 unless a source defines its own collection count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub malloc: u64,
    pub mtalloc: u64,
    pub memsys: u64,
    pub numgc: u64,
}

/// Supplies fresh [`MemoryStats`] on every call.
pub type MemoryStatsFn = Arc<dyn Fn() -> MemoryStats + Send + Sync>;

/// Process facts sampled per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    pub cpus: usize,
    /// `"<os> <arch>"`.
    pub arch: String,
    /// Whole seconds since start.
    pub uptime: u64,
    pub uid: u32,
    pub pid: u32,
    pub gid: u32,
}

impl RuntimeInfo {
    pub fn collect(start: Instant) -> Self {
        let (uid, gid) = ids();
        Self {
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            arch: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            uptime: start.elapsed().as_secs_f64().round() as u64,
            uid,
            pid: std::process::id(),
            gid,
        }
    }
}

#[cfg(unix)]
fn ids() -> (u32, u32) {
    // SAFETY: getuid and getgid have no preconditions and cannot fail.
    unsafe { (libc::getuid(), libc::getgid()) }
}

#[cfg(not(unix))]
fn ids() -> (u32, u32) {
    (0, 0)
}
