// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup pipeline and the `serve` / `check-config` commands.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use poller_config::{ConfigResolver, ResolvedConfig};
use poller_core::{PluginRole, PollerError};
use poller_plugin::{BuildManifest, Catalog, DylibLoader};
use poller_web::{BuildInfo, MemoryStats, WebPlugin, WebState};

use crate::shutdown;
use crate::GlobalArgs;

/// Everything the commands need once configuration is resolved.
pub struct Startup {
    pub catalog: Arc<Catalog>,
    pub web: Arc<WebPlugin>,
    pub resolved: ResolvedConfig,
    pub origin: String,
}

/// Manifest of the workspace crates compiled into this binary.
pub fn build_manifest() -> BuildManifest {
    BuildManifest::from_modules([
        poller_core::MODULE,
        poller_plugin::MODULE,
        poller_config::MODULE,
        poller_web::MODULE,
        (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    ])
}

/// Version details compiled into this binary.
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        branch: option_env!("POLLER_BUILD_BRANCH").unwrap_or("unknown").to_string(),
        date: option_env!("POLLER_BUILD_DATE").unwrap_or("unknown").to_string(),
        rust_version: env!("POLLER_RUSTC_VERSION").to_string(),
    }
}

/// Resolve configuration and load plugins.
///
/// Logging is initialized from the core section (and CLI flags) before any
/// module is loaded.
pub fn startup(args: &GlobalArgs) -> Result<Startup, PollerError> {
    let source = poller_config::open_source(args.config.as_deref())?;
    let origin = source.origin().to_string();

    let catalog = Arc::new(Catalog::new(Arc::new(build_manifest())));
    let web = WebPlugin::register(&catalog)?;

    let resolver = ConfigResolver::new(source, Arc::clone(&catalog), Arc::new(DylibLoader::new()))
        .with_module_dir(&args.module_dir);

    let mut core = resolver.resolve_core()?;
    core.poller.debug |= args.debug;
    core.poller.quiet |= args.quiet;
    init_tracing(core.log_level());
    info!(config = %origin, "poller starting");

    let resolved = resolver.run_with_core(core)?;
    Ok(Startup {
        catalog,
        web,
        resolved,
        origin,
    })
}

/// Runs the `poller serve` command.
///
/// Serves the status surface when the webserver plugin is enabled, and
/// otherwise idles until a shutdown signal so the external polling loop
/// keeps its containers.
pub async fn run_serve(args: &GlobalArgs) -> Result<(), PollerError> {
    let start = Instant::now();
    let Startup {
        catalog,
        web,
        resolved,
        ..
    } = startup(args)?;

    let mut state = WebState::new(Arc::clone(&catalog), resolved.core.poller.clone())
        .with_build(build_info())
        .with_start(start);
    if let Some(source) = memory_stats_source() {
        state = state.with_memory_stats(source);
    }

    let cancel = shutdown::install_signal_handler();
    if web.config().enable {
        web.run(state, cancel).await?;
    } else {
        info!("webserver disabled, waiting for shutdown signal");
        cancel.cancelled().await;
    }

    info!("poller serve shutdown complete");
    Ok(())
}

/// Runs the `poller check-config` command.
///
/// Prints the resolved catalog as JSON on stdout.
pub fn run_check_config(args: &GlobalArgs) -> Result<(), PollerError> {
    let startup = startup(args)?;
    let report = check_report(&startup);
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| PollerError::Internal(format!("rendering report: {e}")))?;
    println!("{text}");
    Ok(())
}

fn check_report(startup: &Startup) -> serde_json::Value {
    let mut plugins = serde_json::Map::new();
    for role in PluginRole::ALL {
        let descriptors = startup.catalog.list_descriptors(role);
        plugins.insert(
            role.plural().to_string(),
            serde_json::to_value(descriptors).unwrap_or_default(),
        );
    }
    serde_json::json!({
        "config": startup.origin,
        "poller": startup.resolved.core.poller,
        "modules": startup.resolved.loaded_modules,
        "plugins": plugins,
    })
}

#[cfg(not(target_env = "msvc"))]
fn memory_stats_source() -> Option<poller_web::MemoryStatsFn> {
    Some(Arc::new(jemalloc_stats))
}

#[cfg(target_env = "msvc")]
fn memory_stats_source() -> Option<poller_web::MemoryStatsFn> {
    None
}

/// Read jemalloc counters (requires epoch advance for fresh data).
#[cfg(not(target_env = "msvc"))]
fn jemalloc_stats() -> MemoryStats {
    use tikv_jemalloc_ctl::{epoch, stats};

    if let Err(e) = epoch::advance() {
        debug!(error = %e, "jemalloc epoch advance failed");
    }
    MemoryStats {
        malloc: stats::allocated::read().unwrap_or(0) as u64,
        mtalloc: stats::active::read().unwrap_or(0) as u64,
        memsys: stats::resident::read().unwrap_or(0) as u64,
        numgc: 0,
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` overrides the level when set. Logs go to stderr so
/// `check-config` output stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "poller={log_level},poller_core={log_level},poller_plugin={log_level},\
             poller_config={log_level},poller_web={log_level},tower_http={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
